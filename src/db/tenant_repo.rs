use rusqlite::{params, Connection, OptionalExtension};

use crate::error::PlazaResult;
use crate::model::{Id, Tenant, TenantLink, User};

use super::parse_id;

pub fn insert(conn: &Connection, tenant: &Tenant) -> PlazaResult<()> {
    conn.execute(
        "INSERT INTO tenants (id, name) VALUES (?1, ?2)",
        params![tenant.id.to_string(), tenant.name],
    )?;
    for member in &tenant.members {
        add_member(conn, tenant.id, *member, false)?;
    }
    for admin in &tenant.admins {
        add_member(conn, tenant.id, *admin, true)?;
    }
    Ok(())
}

pub fn find_by_id(conn: &Connection, id: Id<Tenant>) -> PlazaResult<Option<Tenant>> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT id, name FROM tenants WHERE id = ?1",
            params![id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((id_str, name)) = row else {
        return Ok(None);
    };

    let tenant_id: Id<Tenant> = parse_id(&id_str)?;
    let mut stmt =
        conn.prepare("SELECT user_id, admin FROM tenant_members WHERE tenant_id = ?1")?;
    let rows: Vec<(String, i64)> = stmt
        .query_map(params![tenant_id.to_string()], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut members = Vec::new();
    let mut admins = Vec::new();
    for (user_str, admin) in rows {
        let user: Id<User> = parse_id(&user_str)?;
        if admin != 0 {
            admins.push(user);
        } else {
            members.push(user);
        }
    }

    Ok(Some(Tenant {
        id: tenant_id,
        name,
        members,
        admins,
    }))
}

pub fn add_member(
    conn: &Connection,
    tenant_id: Id<Tenant>,
    user: Id<User>,
    admin: bool,
) -> PlazaResult<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO tenant_members (tenant_id, user_id, admin) VALUES (?1, ?2, ?3)",
        params![tenant_id.to_string(), user.to_string(), admin as i64],
    )?;
    Ok(changed > 0)
}

pub fn remove_member(conn: &Connection, tenant_id: Id<Tenant>, user: Id<User>) -> PlazaResult<bool> {
    let changed = conn.execute(
        "DELETE FROM tenant_members WHERE tenant_id = ?1 AND user_id = ?2",
        params![tenant_id.to_string(), user.to_string()],
    )?;
    Ok(changed > 0)
}

/// Derived tenant links for a user, sorted by tenant id so the result
/// is canonical. Admins carry the "admin" privilege entry.
pub fn links_for_user(conn: &Connection, user: Id<User>) -> PlazaResult<Vec<TenantLink>> {
    let mut stmt = conn.prepare(
        "SELECT tenant_id, admin FROM tenant_members WHERE user_id = ?1 ORDER BY tenant_id",
    )?;
    let rows: Vec<(String, i64)> = stmt
        .query_map(params![user.to_string()], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut links = Vec::with_capacity(rows.len());
    for (tenant_str, admin) in rows {
        links.push(TenantLink {
            tenant: parse_id(&tenant_str)?,
            privileges: if admin != 0 {
                vec!["admin".to_string()]
            } else {
                Vec::new()
            },
        });
    }
    Ok(links)
}
