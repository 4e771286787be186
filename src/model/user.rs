use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ids::Id;
use super::sets;
use super::tenant::Tenant;
use super::Group;

/// A user's derived membership in one tenant, with the privileges they
/// carry there ("admin" for tenant admins).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantLink {
    pub tenant: Id<Tenant>,
    pub privileges: Vec<String>,
}

/// An account.
///
/// `badges`, `groups` and `tenants` are derived fields kept in sync by
/// `denorm::user_denorm`; `privileges` is primary (granted by operators).
#[derive(Debug, Clone)]
pub struct User {
    pub id: Id<User>,
    pub username: String,
    pub privileges: Vec<String>,
    /// Derived: ids of groups this user belongs to, plus the user's own
    /// id. Checked against `editors` lists for edit access.
    pub badges: Vec<Uuid>,
    /// Derived: ids of groups this user belongs to.
    pub groups: Vec<Id<Group>>,
    /// Derived: tenants where this user is a member or admin.
    pub tenants: Vec<TenantLink>,
}

impl User {
    pub fn create(username: String) -> Self {
        let id: Id<User> = Id::generate();
        Self {
            id,
            username,
            privileges: Vec::new(),
            // Best-effort seed; update_badges re-derives from group
            // membership later.
            badges: vec![id.value],
            groups: Vec::new(),
            tenants: Vec::new(),
        }
    }

    pub fn privileged(&self, privilege: &str) -> bool {
        self.privileges.iter().any(|p| p == privilege)
    }

    pub fn is_admin(&self) -> bool {
        self.privileged("admin")
    }

    /// Whether this user may edit a document with the given editors
    /// list: any badge (own id or a group the user belongs to) present
    /// in `editors` grants access.
    pub fn may_edit(&self, editors: &[Uuid]) -> bool {
        sets::intersects(&self.badges, editors)
    }
}
