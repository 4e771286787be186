use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::PlazaResult;

use super::{fmt_time, ids_from_json, ids_to_json, parse_time};

/// One command-dispatch record: an intent entry written before `apply`,
/// finalized with a success or error marker afterwards. Append-only.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub id: i64,
    pub track: String,
    pub rel: Vec<Uuid>,
    pub body: serde_json::Value,
    pub ts: DateTime<Utc>,
    pub result: Option<String>,
    pub detail: Option<String>,
}

pub fn intent(
    conn: &Connection,
    track: &str,
    rel: &[Uuid],
    body: &serde_json::Value,
    now: DateTime<Utc>,
) -> PlazaResult<i64> {
    conn.execute(
        "INSERT INTO command_log (track, rel, body, ts) VALUES (?1, ?2, ?3, ?4)",
        params![track, ids_to_json(rel)?, body.to_string(), fmt_time(now)],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn success(conn: &Connection, entry_id: i64, now: DateTime<Utc>) -> PlazaResult<()> {
    conn.execute(
        "UPDATE command_log SET result = 'success', finished_at = ?2 WHERE id = ?1",
        params![entry_id, fmt_time(now)],
    )?;
    Ok(())
}

pub fn failure(
    conn: &Connection,
    entry_id: i64,
    detail: &str,
    now: DateTime<Utc>,
) -> PlazaResult<()> {
    conn.execute(
        "UPDATE command_log SET result = 'error', detail = ?2, finished_at = ?3 WHERE id = ?1",
        params![entry_id, detail, fmt_time(now)],
    )?;
    Ok(())
}

pub fn find_by_id(conn: &Connection, entry_id: i64) -> PlazaResult<Option<LogEntry>> {
    let row: Option<(i64, String, String, String, String, Option<String>, Option<String>)> = conn
        .query_row(
            "SELECT id, track, rel, body, ts, result, detail FROM command_log WHERE id = ?1",
            params![entry_id],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                ))
            },
        )
        .optional()?;

    row.map(
        |(id, track, rel_json, body_json, ts_str, result, detail)| {
            Ok(LogEntry {
                id,
                track,
                rel: ids_from_json(&rel_json)?,
                body: serde_json::from_str(&body_json)?,
                ts: parse_time(&ts_str)?,
                result,
                detail,
            })
        },
    )
    .transpose()
}

pub fn entries(conn: &Connection) -> PlazaResult<Vec<LogEntry>> {
    let mut stmt = conn.prepare("SELECT id FROM command_log ORDER BY id")?;
    let ids: Vec<i64> = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(entry) = find_by_id(conn, id)? {
            out.push(entry);
        }
    }
    Ok(out)
}
