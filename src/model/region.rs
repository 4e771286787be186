use super::ids::Id;
use super::tenant::Tenant;

/// A geographic region. `course_count` and `future_event_count` are
/// derived counters refreshed by `denorm::region_denorm`.
#[derive(Debug, Clone)]
pub struct Region {
    pub id: Id<Region>,
    pub name: String,
    pub tenant: Id<Tenant>,
    pub course_count: i64,
    pub future_event_count: i64,
}

impl Region {
    pub fn create(name: String, tenant: Id<Tenant>) -> Self {
        Self {
            id: Id::generate(),
            name,
            tenant,
            course_count: 0,
            future_event_count: 0,
        }
    }
}
