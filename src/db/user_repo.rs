use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::PlazaResult;
use crate::model::{Group, Id, TenantLink, User};

use super::{ids_from_json, ids_to_json, parse_id, typed_ids_from_json, typed_ids_to_json};

pub fn insert(conn: &Connection, user: &User) -> PlazaResult<()> {
    conn.execute(
        "INSERT INTO users (id, username, privileges, badges, groups, tenants)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user.id.to_string(),
            user.username,
            serde_json::to_string(&user.privileges)?,
            ids_to_json(&user.badges)?,
            typed_ids_to_json(&user.groups)?,
            serde_json::to_string(&user.tenants)?,
        ],
    )?;
    Ok(())
}

pub fn find_by_id(conn: &Connection, id: Id<User>) -> PlazaResult<Option<User>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, privileges, badges, groups, tenants FROM users WHERE id = ?1",
    )?;

    let row: Option<(String, String, String, String, String, String)> = stmt
        .query_row(params![id.to_string()], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
            ))
        })
        .optional()?;

    let Some((id_str, username, privileges_json, badges_json, groups_json, tenants_json)) = row
    else {
        return Ok(None);
    };

    Ok(Some(User {
        id: parse_id(&id_str)?,
        username,
        privileges: serde_json::from_str(&privileges_json)?,
        badges: ids_from_json(&badges_json)?,
        groups: typed_ids_from_json(&groups_json)?,
        tenants: serde_json::from_str(&tenants_json)?,
    }))
}

/// Conditional update of the derived group membership (`badges` and
/// `groups` together). Reports whether anything was written.
pub fn set_membership_if_changed(
    conn: &Connection,
    user_id: Id<User>,
    badges: &[Uuid],
    groups: &[Id<Group>],
) -> PlazaResult<bool> {
    let badges_json = ids_to_json(badges)?;
    let groups_json = typed_ids_to_json(groups)?;
    let changed = conn.execute(
        "UPDATE users SET badges = ?2, groups = ?3
         WHERE id = ?1 AND (badges IS NOT ?2 OR groups IS NOT ?3)",
        params![user_id.to_string(), badges_json, groups_json],
    )?;
    Ok(changed > 0)
}

/// Conditional update of the derived tenant links. The links must be in
/// a stable order (sorted by tenant id) so equal sets compare equal.
pub fn set_tenants_if_changed(
    conn: &Connection,
    user_id: Id<User>,
    tenants: &[TenantLink],
) -> PlazaResult<bool> {
    let json = serde_json::to_string(tenants)?;
    let changed = conn.execute(
        "UPDATE users SET tenants = ?2 WHERE id = ?1 AND tenants IS NOT ?2",
        params![user_id.to_string(), json],
    )?;
    Ok(changed > 0)
}
