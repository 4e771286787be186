use rusqlite::{params, Connection, OptionalExtension};

use crate::error::PlazaResult;
use crate::model::{Group, Id, User};

use super::parse_id;

pub fn insert(conn: &Connection, group: &Group) -> PlazaResult<()> {
    conn.execute(
        "INSERT INTO groups (id, name) VALUES (?1, ?2)",
        params![group.id.to_string(), group.name],
    )?;
    for member in &group.members {
        conn.execute(
            "INSERT INTO group_members (group_id, user_id) VALUES (?1, ?2)",
            params![group.id.to_string(), member.to_string()],
        )?;
    }
    Ok(())
}

pub fn find_by_id(conn: &Connection, id: Id<Group>) -> PlazaResult<Option<Group>> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT id, name FROM groups WHERE id = ?1",
            params![id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((id_str, name)) = row else {
        return Ok(None);
    };

    let group_id: Id<Group> = parse_id(&id_str)?;
    let mut stmt = conn.prepare("SELECT user_id FROM group_members WHERE group_id = ?1")?;
    let member_strs: Vec<String> = stmt
        .query_map(params![group_id.to_string()], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(Group {
        id: group_id,
        name,
        members: member_strs
            .iter()
            .map(|s| parse_id(s))
            .collect::<PlazaResult<Vec<_>>>()?,
    }))
}

pub fn add_member(conn: &Connection, group_id: Id<Group>, user: Id<User>) -> PlazaResult<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO group_members (group_id, user_id) VALUES (?1, ?2)",
        params![group_id.to_string(), user.to_string()],
    )?;
    Ok(changed > 0)
}

pub fn remove_member(conn: &Connection, group_id: Id<Group>, user: Id<User>) -> PlazaResult<bool> {
    let changed = conn.execute(
        "DELETE FROM group_members WHERE group_id = ?1 AND user_id = ?2",
        params![group_id.to_string(), user.to_string()],
    )?;
    Ok(changed > 0)
}

/// Ids of all groups the user belongs to; feeds the derived
/// `badges`/`groups` fields on the user document.
pub fn ids_with_member(conn: &Connection, user: Id<User>) -> PlazaResult<Vec<Id<Group>>> {
    let mut stmt = conn.prepare("SELECT group_id FROM group_members WHERE user_id = ?1")?;
    let ids: Vec<String> = stmt
        .query_map(params![user.to_string()], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    ids.iter().map(|s| parse_id(s)).collect()
}
