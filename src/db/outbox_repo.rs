use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::error::PlazaResult;

use super::fmt_time;

/// Append a serialized trigger payload. The outbox is the durable form
/// of the system's fire-and-forget recompute calls: enqueuing is part
/// of the triggering write, execution happens on a later `drain`.
pub fn enqueue(conn: &Connection, payload: &str, now: DateTime<Utc>) -> PlazaResult<i64> {
    conn.execute(
        "INSERT INTO outbox (payload, enqueued_at) VALUES (?1, ?2)",
        params![payload, fmt_time(now)],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Snapshot of currently-pending rows, oldest first.
pub fn pending(conn: &Connection) -> PlazaResult<Vec<(i64, String)>> {
    let mut stmt = conn.prepare("SELECT id, payload FROM outbox WHERE done = 0 ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn mark_done(conn: &Connection, id: i64) -> PlazaResult<()> {
    conn.execute("UPDATE outbox SET done = 1 WHERE id = ?1", params![id])?;
    Ok(())
}
