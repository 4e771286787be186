use super::ids::Id;
use super::user::User;

/// A group of users promoting and organizing courses together.
/// Membership is primary; it feeds the derived `badges`/`groups` fields
/// on users.
#[derive(Debug, Clone)]
pub struct Group {
    pub id: Id<Group>,
    pub name: String,
    pub members: Vec<Id<User>>,
}

impl Group {
    pub fn create(name: String) -> Self {
        Self {
            id: Id::generate(),
            name,
            members: Vec::new(),
        }
    }
}
