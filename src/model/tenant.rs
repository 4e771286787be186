use super::ids::Id;
use super::user::User;

/// An organizational scope restricting visibility of courses, events
/// and regions to its members and admins. Members and admins are
/// primary fields, not derived.
#[derive(Debug, Clone)]
pub struct Tenant {
    pub id: Id<Tenant>,
    pub name: String,
    pub members: Vec<Id<User>>,
    pub admins: Vec<Id<User>>,
}

impl Tenant {
    pub fn create(name: String) -> Self {
        Self {
            id: Id::generate(),
            name,
            members: Vec::new(),
            admins: Vec::new(),
        }
    }
}
