use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::PlazaResult;
use crate::model::{Course, CourseMember, EventPointer, Id, Region, Role, User};

use super::{
    fmt_time, ids_from_json, ids_to_json, parse_id, parse_time, typed_ids_from_json,
    typed_ids_to_json,
};

pub fn insert(conn: &Connection, course: &Course) -> PlazaResult<()> {
    conn.execute(
        "INSERT INTO courses (id, name, region_id, tenant_id, roles, group_organizers, groups,
                              editors, interested, next_event, last_event, future_events,
                              created_by, time_created, time_lastedit)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            course.id.to_string(),
            course.name,
            course.region.to_string(),
            course.tenant.map(|t| t.to_string()),
            serde_json::to_string(&course.roles)?,
            typed_ids_to_json(&course.group_organizers)?,
            typed_ids_to_json(&course.groups)?,
            ids_to_json(&course.editors)?,
            course.interested,
            pointer_to_json(course.next_event.as_ref())?,
            pointer_to_json(course.last_event.as_ref())?,
            course.future_events,
            course.created_by.to_string(),
            fmt_time(course.time_created),
            fmt_time(course.time_lastedit),
        ],
    )?;

    for member in &course.members {
        conn.execute(
            "INSERT INTO course_members (course_id, user_id, comment) VALUES (?1, ?2, ?3)",
            params![course.id.to_string(), member.user.to_string(), member.comment],
        )?;
        for role in &member.roles {
            conn.execute(
                "INSERT INTO course_member_roles (course_id, user_id, role) VALUES (?1, ?2, ?3)",
                params![course.id.to_string(), member.user.to_string(), role.as_str()],
            )?;
        }
    }

    Ok(())
}

pub fn find_by_id(conn: &Connection, id: Id<Course>) -> PlazaResult<Option<Course>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, region_id, tenant_id, roles, group_organizers, groups, editors,
                interested, next_event, last_event, future_events, created_by,
                time_created, time_lastedit
         FROM courses WHERE id = ?1",
    )?;

    type Row = (
        String,
        String,
        String,
        Option<String>,
        String,
        String,
        String,
        String,
        i64,
        Option<String>,
        Option<String>,
        i64,
        String,
        String,
        String,
    );

    let row: Option<Row> = stmt
        .query_row(params![id.to_string()], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
                row.get(8)?,
                row.get(9)?,
                row.get(10)?,
                row.get(11)?,
                row.get(12)?,
                row.get(13)?,
                row.get(14)?,
            ))
        })
        .optional()?;

    let Some((
        id_str,
        name,
        region_str,
        tenant_str,
        roles_json,
        organizers_json,
        groups_json,
        editors_json,
        interested,
        next_json,
        last_json,
        future_events,
        created_by_str,
        created_str,
        lastedit_str,
    )) = row
    else {
        return Ok(None);
    };

    let course_id: Id<Course> = parse_id(&id_str)?;
    Ok(Some(Course {
        id: course_id,
        name,
        region: parse_id(&region_str)?,
        tenant: tenant_str.as_deref().map(parse_id).transpose()?,
        roles: serde_json::from_str(&roles_json)?,
        members: find_members(conn, course_id)?,
        group_organizers: typed_ids_from_json(&organizers_json)?,
        groups: typed_ids_from_json(&groups_json)?,
        editors: ids_from_json(&editors_json)?,
        interested,
        next_event: pointer_from_json(next_json.as_deref())?,
        last_event: pointer_from_json(last_json.as_deref())?,
        future_events,
        created_by: parse_id(&created_by_str)?,
        time_created: parse_time(&created_str)?,
        time_lastedit: parse_time(&lastedit_str)?,
    }))
}

fn find_members(conn: &Connection, course_id: Id<Course>) -> PlazaResult<Vec<CourseMember>> {
    let mut stmt =
        conn.prepare("SELECT user_id, comment FROM course_members WHERE course_id = ?1")?;
    let rows: Vec<(String, Option<String>)> = stmt
        .query_map(params![course_id.to_string()], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut members = Vec::with_capacity(rows.len());
    for (user_str, comment) in rows {
        let user: Id<User> = parse_id(&user_str)?;
        members.push(CourseMember {
            user,
            roles: find_member_roles(conn, course_id, user)?,
            comment,
        });
    }
    Ok(members)
}

fn find_member_roles(
    conn: &Connection,
    course_id: Id<Course>,
    user: Id<User>,
) -> PlazaResult<Vec<Role>> {
    let mut stmt = conn.prepare(
        "SELECT role FROM course_member_roles WHERE course_id = ?1 AND user_id = ?2",
    )?;
    let names: Vec<String> = stmt
        .query_map(params![course_id.to_string(), user.to_string()], |row| {
            row.get(0)
        })?
        .collect::<Result<Vec<_>, _>>()?;

    names.iter().map(|n| Role::from_str(n)).collect()
}

/// Add a member entry if absent. The caller adds a role right after, so
/// a member never persists with an empty role list.
pub fn add_member(conn: &Connection, course_id: Id<Course>, user: Id<User>) -> PlazaResult<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO course_members (course_id, user_id) VALUES (?1, ?2)",
        params![course_id.to_string(), user.to_string()],
    )?;
    Ok(changed > 0)
}

pub fn add_member_role(
    conn: &Connection,
    course_id: Id<Course>,
    user: Id<User>,
    role: Role,
) -> PlazaResult<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO course_member_roles (course_id, user_id, role) VALUES (?1, ?2, ?3)",
        params![course_id.to_string(), user.to_string(), role.as_str()],
    )?;
    Ok(changed > 0)
}

pub fn remove_member_role(
    conn: &Connection,
    course_id: Id<Course>,
    user: Id<User>,
    role: Role,
) -> PlazaResult<bool> {
    let changed = conn.execute(
        "DELETE FROM course_member_roles WHERE course_id = ?1 AND user_id = ?2 AND role = ?3",
        params![course_id.to_string(), user.to_string(), role.as_str()],
    )?;
    Ok(changed > 0)
}

pub fn set_member_comment(
    conn: &Connection,
    course_id: Id<Course>,
    user: Id<User>,
    comment: Option<&str>,
) -> PlazaResult<bool> {
    let changed = conn.execute(
        "UPDATE course_members SET comment = ?3 WHERE course_id = ?1 AND user_id = ?2",
        params![course_id.to_string(), user.to_string(), comment],
    )?;
    Ok(changed > 0)
}

/// Remove member entries whose role list became empty.
pub fn prune_memberless(conn: &Connection, course_id: Id<Course>) -> PlazaResult<usize> {
    let pruned = conn.execute(
        "DELETE FROM course_members
         WHERE course_id = ?1
           AND NOT EXISTS (SELECT 1 FROM course_member_roles r
                           WHERE r.course_id = course_members.course_id
                             AND r.user_id = course_members.user_id)",
        params![course_id.to_string()],
    )?;
    Ok(pruned)
}

/// Conditional update: writes only when the stored value differs from
/// the freshly computed one, and reports whether it wrote. A `false`
/// return is the convergence signal.
pub fn set_editors_if_changed(
    conn: &Connection,
    course_id: Id<Course>,
    editors: &[Uuid],
) -> PlazaResult<bool> {
    let json = ids_to_json(editors)?;
    let changed = conn.execute(
        "UPDATE courses SET editors = ?2 WHERE id = ?1 AND editors IS NOT ?2",
        params![course_id.to_string(), json],
    )?;
    Ok(changed > 0)
}

pub fn set_interested_if_changed(
    conn: &Connection,
    course_id: Id<Course>,
    interested: i64,
) -> PlazaResult<bool> {
    let changed = conn.execute(
        "UPDATE courses SET interested = ?2 WHERE id = ?1 AND interested IS NOT ?2",
        params![course_id.to_string(), interested],
    )?;
    Ok(changed > 0)
}

/// Direct removal of a user from the editors list. Used by the
/// unsubscribe cascade; the next `update_groups` run re-derives the
/// full list anyway.
pub fn pull_editor(conn: &Connection, course_id: Id<Course>, user: Id<User>) -> PlazaResult<bool> {
    let editors: Option<String> = conn
        .query_row(
            "SELECT editors FROM courses WHERE id = ?1",
            params![course_id.to_string()],
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
        "UPDATE courses SET editors = ?2 WHERE id = ?1",
        params![course_id.to_string(), ids_to_json(&ids)?],
    )?;
    Ok(true)
}

/// Owner edit of the promoting groups list. Callers are expected to
/// trigger the group recomputes afterwards.
pub fn set_groups(
    conn: &Connection,
    course_id: Id<Course>,
    groups: &[Id<crate::model::Group>],
) -> PlazaResult<()> {
    conn.execute(
        "UPDATE courses SET groups = ?2 WHERE id = ?1",
        params![course_id.to_string(), typed_ids_to_json(groups)?],
    )?;
    Ok(())
}

pub fn set_group_organizers(
    conn: &Connection,
    course_id: Id<Course>,
    organizers: &[Id<crate::model::Group>],
) -> PlazaResult<()> {
    conn.execute(
        "UPDATE courses SET group_organizers = ?2 WHERE id = ?1",
        params![course_id.to_string(), typed_ids_to_json(organizers)?],
    )?;
    Ok(())
}

pub fn touch(conn: &Connection, course_id: Id<Course>, now: DateTime<Utc>) -> PlazaResult<()> {
    conn.execute(
        "UPDATE courses SET time_lastedit = ?2 WHERE id = ?1",
        params![course_id.to_string(), fmt_time(now)],
    )?;
    Ok(())
}

/// Last-write-wins `$set` of the event projections. Deliberately not a
/// conditional update: brief staleness is tolerated and the periodic
/// sweep recomputes these cheaply.
pub fn set_event_pointers(
    conn: &Connection,
    course_id: Id<Course>,
    next_event: Option<&EventPointer>,
    last_event: Option<&EventPointer>,
    future_events: i64,
) -> PlazaResult<()> {
    conn.execute(
        "UPDATE courses SET next_event = ?2, last_event = ?3, future_events = ?4 WHERE id = ?1",
        params![
            course_id.to_string(),
            pointer_to_json(next_event)?,
            pointer_to_json(last_event)?,
            future_events,
        ],
    )?;
    Ok(())
}

pub fn count_by_region(conn: &Connection, region: Id<Region>) -> PlazaResult<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM courses WHERE region_id = ?1",
        params![region.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn all_ids(conn: &Connection) -> PlazaResult<Vec<Id<Course>>> {
    let mut stmt = conn.prepare("SELECT id FROM courses")?;
    let ids: Vec<String> = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    ids.iter().map(|s| parse_id(s)).collect()
}

// --- course history -------------------------------------------------------

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub kind: String,
    pub user: Id<User>,
    pub data: Option<serde_json::Value>,
    pub time: DateTime<Utc>,
}

pub fn add_history(
    conn: &Connection,
    course_id: Id<Course>,
    kind: &str,
    user: Id<User>,
    data: Option<&serde_json::Value>,
    now: DateTime<Utc>,
) -> PlazaResult<()> {
    conn.execute(
        "INSERT INTO course_history (course_id, kind, user_id, data, time) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            course_id.to_string(),
            kind,
            user.to_string(),
            data.map(serde_json::Value::to_string),
            fmt_time(now),
        ],
    )?;
    Ok(())
}

pub fn history(conn: &Connection, course_id: Id<Course>) -> PlazaResult<Vec<HistoryEntry>> {
    let mut stmt = conn.prepare(
        "SELECT kind, user_id, data, time FROM course_history WHERE course_id = ?1 ORDER BY id",
    )?;
    let rows: Vec<(String, String, Option<String>, String)> = stmt
        .query_map(params![course_id.to_string()], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut entries = Vec::with_capacity(rows.len());
    for (kind, user_str, data_str, time_str) in rows {
        entries.push(HistoryEntry {
            kind,
            user: parse_id(&user_str)?,
            data: data_str.as_deref().map(serde_json::from_str).transpose()?,
            time: parse_time(&time_str)?,
        });
    }
    Ok(entries)
}

// --- pointer column helpers -----------------------------------------------

fn pointer_to_json(pointer: Option<&EventPointer>) -> PlazaResult<Option<String>> {
    pointer
        .map(|p| serde_json::to_string(p).map_err(Into::into))
        .transpose()
}

fn pointer_from_json(json: Option<&str>) -> PlazaResult<Option<EventPointer>> {
    json.map(|j| serde_json::from_str(j).map_err(Into::into))
        .transpose()
}
