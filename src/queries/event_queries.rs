use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::{fmt_time, parse_id, parse_time};
use crate::error::PlazaResult;
use crate::model::{Course, EventPointer, Id};

/// Pointers to all future events of a course (`start >= now`), earliest
/// first. The head of this list is the course's `next_event`.
pub fn future_pointers(
    conn: &Connection,
    course_id: Id<Course>,
    now: DateTime<Utc>,
) -> PlazaResult<Vec<EventPointer>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, start_at FROM events
         WHERE course_id = ?1 AND start_at >= ?2 ORDER BY start_at",
    )?;
    let rows: Vec<(String, String, String)> = stmt
        .query_map(params![course_id.to_string(), fmt_time(now)], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut pointers = Vec::with_capacity(rows.len());
    for (id_str, title, start_str) in rows {
        pointers.push(EventPointer {
            id: parse_id(&id_str)?,
            title,
            start: parse_time(&start_str)?,
        });
    }
    Ok(pointers)
}

/// Pointer to the most recent past event of a course, if any. This is
/// the course's `last_event`.
pub fn last_pointer(
    conn: &Connection,
    course_id: Id<Course>,
    now: DateTime<Utc>,
) -> PlazaResult<Option<EventPointer>> {
    let row: Option<(String, String, String)> = conn
        .query_row(
            "SELECT id, title, start_at FROM events
             WHERE course_id = ?1 AND start_at < ?2 ORDER BY start_at DESC LIMIT 1",
            params![course_id.to_string(), fmt_time(now)],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;

    row.map(|(id_str, title, start_str)| {
        Ok(EventPointer {
            id: parse_id(&id_str)?,
            title,
            start: parse_time(&start_str)?,
        })
    })
    .transpose()
}
