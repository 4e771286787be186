use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::error::PlazaResult;
use crate::model::{Course, Id, Role, User};

use super::{fmt_time, parse_id};

/// A recorded join notification, waiting for the (external) delivery
/// pipeline to pick it up.
#[derive(Debug, Clone)]
pub struct JoinNotification {
    pub course: Id<Course>,
    pub user: Id<User>,
    pub role: String,
    pub comment: Option<String>,
}

pub fn record_join(
    conn: &Connection,
    course: Id<Course>,
    user: Id<User>,
    role: Role,
    comment: Option<&str>,
    now: DateTime<Utc>,
) -> PlazaResult<()> {
    conn.execute(
        "INSERT INTO join_notifications (course_id, user_id, role, comment, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            course.to_string(),
            user.to_string(),
            role.as_str(),
            comment,
            fmt_time(now),
        ],
    )?;
    Ok(())
}

pub fn for_course(conn: &Connection, course: Id<Course>) -> PlazaResult<Vec<JoinNotification>> {
    let mut stmt = conn.prepare(
        "SELECT course_id, user_id, role, comment FROM join_notifications
         WHERE course_id = ?1 ORDER BY id",
    )?;
    let rows: Vec<(String, String, String, Option<String>)> = stmt
        .query_map(params![course.to_string()], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = Vec::with_capacity(rows.len());
    for (course_str, user_str, role, comment) in rows {
        out.push(JoinNotification {
            course: parse_id(&course_str)?,
            user: parse_id(&user_str)?,
            role,
            comment,
        });
    }
    Ok(out)
}
