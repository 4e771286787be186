use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::course::Course;
use super::ids::Id;
use super::region::Region;
use super::sets;
use super::tenant::Tenant;
use super::user::User;
use super::Group;

/// Compact projection of an event stored on its course (`next_event` /
/// `last_event`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPointer {
    pub id: Id<Event>,
    pub title: String,
    pub start: DateTime<Utc>,
}

/// A scheduled occurrence, usually belonging to a course.
///
/// `course_groups`, `all_groups`, `editors` and `tenant` are derived.
/// For past events (`start < now`) `course_groups` is frozen: it keeps
/// the value inherited while the event was in the future and is never
/// re-derived from the live course again.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: Id<Event>,
    pub title: String,
    pub region: Id<Region>,
    pub tenant: Option<Id<Tenant>>,
    pub course_id: Option<Id<Course>>,
    pub created_by: Id<User>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Groups whose organizers may edit this event.
    pub group_organizers: Vec<Id<Group>>,
    /// Groups promoting this event directly.
    pub groups: Vec<Id<Group>>,
    /// Derived: groups inherited from the parent course.
    pub course_groups: Vec<Id<Group>>,
    /// Derived: groups ∪ course_groups.
    pub all_groups: Vec<Id<Group>>,
    /// Derived: group organizers plus course editors (or the creator
    /// for courseless events).
    pub editors: Vec<Uuid>,
}

impl Event {
    pub fn create(
        title: String,
        region: Id<Region>,
        tenant: Option<Id<Tenant>>,
        course_id: Option<Id<Course>>,
        created_by: Id<User>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Id::generate(),
            title,
            region,
            tenant,
            course_id,
            created_by,
            start,
            end,
            group_organizers: Vec::new(),
            groups: Vec::new(),
            course_groups: Vec::new(),
            all_groups: Vec::new(),
            editors: vec![created_by.value],
        }
    }

    pub fn pointer(&self) -> EventPointer {
        EventPointer {
            id: self.id,
            title: self.title.clone(),
            start: self.start,
        }
    }

    pub fn group_ids(&self) -> Vec<Uuid> {
        sets::canonical(self.groups.iter().map(|g| g.value).collect())
    }

    pub fn course_group_ids(&self) -> Vec<Uuid> {
        sets::canonical(self.course_groups.iter().map(|g| g.value).collect())
    }

    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.start < now
    }
}
