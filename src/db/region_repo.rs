use rusqlite::{params, Connection, OptionalExtension};

use crate::error::PlazaResult;
use crate::model::{Id, Region};

use super::parse_id;

pub fn insert(conn: &Connection, region: &Region) -> PlazaResult<()> {
    conn.execute(
        "INSERT INTO regions (id, tenant_id, name, course_count, future_event_count)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            region.id.to_string(),
            region.tenant.to_string(),
            region.name,
            region.course_count,
            region.future_event_count,
        ],
    )?;
    Ok(())
}

pub fn find_by_id(conn: &Connection, id: Id<Region>) -> PlazaResult<Option<Region>> {
    let row: Option<(String, String, String, i64, i64)> = conn
        .query_row(
            "SELECT id, tenant_id, name, course_count, future_event_count
             FROM regions WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            },
        )
        .optional()?;

    let Some((id_str, tenant_str, name, course_count, future_event_count)) = row else {
        return Ok(None);
    };

    Ok(Some(Region {
        id: parse_id(&id_str)?,
        tenant: parse_id(&tenant_str)?,
        name,
        course_count,
        future_event_count,
    }))
}

pub fn all_ids(conn: &Connection) -> PlazaResult<Vec<Id<Region>>> {
    let mut stmt = conn.prepare("SELECT id FROM regions")?;
    let ids: Vec<String> = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    ids.iter().map(|s| parse_id(s)).collect()
}

/// Conditional update of both derived counters. Reports whether
/// anything was written.
pub fn set_counters_if_changed(
    conn: &Connection,
    region_id: Id<Region>,
    course_count: i64,
    future_event_count: i64,
) -> PlazaResult<bool> {
    let changed = conn.execute(
        "UPDATE regions SET course_count = ?2, future_event_count = ?3
         WHERE id = ?1 AND (course_count IS NOT ?2 OR future_event_count IS NOT ?3)",
        params![region_id.to_string(), course_count, future_event_count],
    )?;
    Ok(changed > 0)
}
