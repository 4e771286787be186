use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::error::PlazaResult;
use crate::model::{Course, Event, Id, Region, User};

use super::{
    fmt_time, ids_from_json, ids_to_json, parse_id, parse_time, typed_ids_from_json,
    typed_ids_to_json,
};

const EVENT_COLUMNS: &str = "id, title, region_id, tenant_id, course_id, created_by, start_at,
                             end_at, group_organizers, groups, course_groups, all_groups, editors";

pub fn insert(conn: &Connection, event: &Event) -> PlazaResult<()> {
    conn.execute(
        "INSERT INTO events (id, title, region_id, tenant_id, course_id, created_by, start_at,
                             end_at, group_organizers, groups, course_groups, all_groups, editors)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            event.id.to_string(),
            event.title,
            event.region.to_string(),
            event.tenant.map(|t| t.to_string()),
            event.course_id.map(|c| c.to_string()),
            event.created_by.to_string(),
            fmt_time(event.start),
            fmt_time(event.end),
            typed_ids_to_json(&event.group_organizers)?,
            typed_ids_to_json(&event.groups)?,
            typed_ids_to_json(&event.course_groups)?,
            typed_ids_to_json(&event.all_groups)?,
            ids_to_json(&event.editors)?,
        ],
    )?;
    Ok(())
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<RawEvent> {
    Ok(RawEvent {
        id: row.get(0)?,
        title: row.get(1)?,
        region: row.get(2)?,
        tenant: row.get(3)?,
        course_id: row.get(4)?,
        created_by: row.get(5)?,
        start: row.get(6)?,
        end: row.get(7)?,
        group_organizers: row.get(8)?,
        groups: row.get(9)?,
        course_groups: row.get(10)?,
        all_groups: row.get(11)?,
        editors: row.get(12)?,
    })
}

struct RawEvent {
    id: String,
    title: String,
    region: String,
    tenant: Option<String>,
    course_id: Option<String>,
    created_by: String,
    start: String,
    end: String,
    group_organizers: String,
    groups: String,
    course_groups: String,
    all_groups: String,
    editors: String,
}

impl RawEvent {
    fn into_event(self) -> PlazaResult<Event> {
        Ok(Event {
            id: parse_id(&self.id)?,
            title: self.title,
            region: parse_id(&self.region)?,
            tenant: self.tenant.as_deref().map(parse_id).transpose()?,
            course_id: self.course_id.as_deref().map(parse_id).transpose()?,
            created_by: parse_id(&self.created_by)?,
            start: parse_time(&self.start)?,
            end: parse_time(&self.end)?,
            group_organizers: typed_ids_from_json(&self.group_organizers)?,
            groups: typed_ids_from_json(&self.groups)?,
            course_groups: typed_ids_from_json(&self.course_groups)?,
            all_groups: typed_ids_from_json(&self.all_groups)?,
            editors: ids_from_json(&self.editors)?,
        })
    }
}

pub fn find_by_id(conn: &Connection, id: Id<Event>) -> PlazaResult<Option<Event>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"
    ))?;
    let raw = stmt
        .query_row(params![id.to_string()], event_from_row)
        .optional()?;
    raw.map(RawEvent::into_event).transpose()
}

pub fn find_by_course(conn: &Connection, course_id: Id<Course>) -> PlazaResult<Vec<Event>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE course_id = ?1 ORDER BY start_at"
    ))?;
    let raws: Vec<RawEvent> = stmt
        .query_map(params![course_id.to_string()], event_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    raws.into_iter().map(RawEvent::into_event).collect()
}

pub fn ids_by_course(conn: &Connection, course_id: Id<Course>) -> PlazaResult<Vec<Id<Event>>> {
    let mut stmt = conn.prepare("SELECT id FROM events WHERE course_id = ?1")?;
    let ids: Vec<String> = stmt
        .query_map(params![course_id.to_string()], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    ids.iter().map(|s| parse_id(s)).collect()
}

/// Conditional update of the derived fields. `course_groups` is `None`
/// for past events: their stored inheritance is frozen and must not be
/// touched. Reports whether anything was written.
pub fn set_derived_if_changed(
    conn: &Connection,
    event_id: Id<Event>,
    editors: &[Uuid],
    course_groups: Option<&[Uuid]>,
    all_groups: &[Uuid],
) -> PlazaResult<bool> {
    let editors_json = ids_to_json(editors)?;
    let all_groups_json = ids_to_json(all_groups)?;

    let changed = match course_groups {
        Some(course_groups) => {
            let course_groups_json = ids_to_json(course_groups)?;
            conn.execute(
                "UPDATE events SET editors = ?2, course_groups = ?3, all_groups = ?4
                 WHERE id = ?1
                   AND (editors IS NOT ?2 OR course_groups IS NOT ?3 OR all_groups IS NOT ?4)",
                params![event_id.to_string(), editors_json, course_groups_json, all_groups_json],
            )?
        }
        None => conn.execute(
            "UPDATE events SET editors = ?2, all_groups = ?3
             WHERE id = ?1 AND (editors IS NOT ?2 OR all_groups IS NOT ?3)",
            params![event_id.to_string(), editors_json, all_groups_json],
        )?,
    };
    Ok(changed > 0)
}

/// Owner edit of the event's own promoting groups.
pub fn set_groups(
    conn: &Connection,
    event_id: Id<Event>,
    groups: &[Id<crate::model::Group>],
) -> PlazaResult<()> {
    conn.execute(
        "UPDATE events SET groups = ?2 WHERE id = ?1",
        params![event_id.to_string(), typed_ids_to_json(groups)?],
    )?;
    Ok(())
}

pub fn set_group_organizers(
    conn: &Connection,
    event_id: Id<Event>,
    organizers: &[Id<crate::model::Group>],
) -> PlazaResult<()> {
    conn.execute(
        "UPDATE events SET group_organizers = ?2 WHERE id = ?1",
        params![event_id.to_string(), typed_ids_to_json(organizers)?],
    )?;
    Ok(())
}

/// Direct removal of a user from the editors list (unsubscribe cascade).
pub fn pull_editor(conn: &Connection, event_id: Id<Event>, user: Id<User>) -> PlazaResult<bool> {
    let editors: Option<String> = conn
        .query_row(
            "SELECT editors FROM events WHERE id = ?1",
            params![event_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    let Some(json) = editors else {
        return Ok(false);
    };

    let mut ids = ids_from_json(&json)?;
    let before = ids.len();
    ids.retain(|id| *id != user.value);
    if ids.len() == before {
        return Ok(false);
    }

    conn.execute(
        "UPDATE events SET editors = ?2 WHERE id = ?1",
        params![event_id.to_string(), ids_to_json(&ids)?],
    )?;
    Ok(true)
}

pub fn count_future_by_region(
    conn: &Connection,
    region: Id<Region>,
    now: DateTime<Utc>,
) -> PlazaResult<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM events WHERE region_id = ?1 AND start_at >= ?2",
        params![region.to_string(), fmt_time(now)],
        |row| row.get(0),
    )?;
    Ok(count)
}
