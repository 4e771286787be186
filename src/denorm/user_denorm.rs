use rusqlite::Connection;

use crate::db::{group_repo, tenant_repo, user_repo};
use crate::error::PlazaResult;
use crate::model::{sets, Id, User};

use super::convergence::{converge, Outcome, StepResult};

/// Recompute a user's derived `groups` (memberships) and `badges`
/// (memberships plus the user's own id).
pub fn update_badges(conn: &Connection, user_id: Id<User>) -> PlazaResult<Outcome> {
    converge(|| {
        if user_repo::find_by_id(conn, user_id)?.is_none() {
            return Ok(StepResult::Missing);
        }
        let groups = group_repo::ids_with_member(conn, user_id)?;
        let group_ids: Vec<_> = groups.iter().map(|g| g.value).collect();
        let badges = sets::union(&group_ids, &[user_id.value]);
        if user_repo::set_membership_if_changed(conn, user_id, &badges, &groups)? {
            Ok(StepResult::Wrote)
        } else {
            Ok(StepResult::Clean)
        }
    })
}

/// Recompute a user's derived tenant links from `tenant_members`.
pub fn update_tenants(conn: &Connection, user_id: Id<User>) -> PlazaResult<Outcome> {
    converge(|| {
        if user_repo::find_by_id(conn, user_id)?.is_none() {
            return Ok(StepResult::Missing);
        }
        let links = tenant_repo::links_for_user(conn, user_id)?;
        if user_repo::set_tenants_if_changed(conn, user_id, &links)? {
            Ok(StepResult::Wrote)
        } else {
            Ok(StepResult::Clean)
        }
    })
}
