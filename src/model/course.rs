use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::PlazaError;

use super::event::EventPointer;
use super::ids::Id;
use super::region::Region;
use super::sets;
use super::tenant::Tenant;
use super::user::User;
use super::Group;

/// A role a member can hold on a course. `Team` carries editing rights;
/// the other roles express interest or an offer to help.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Participant,
    Mentor,
    Host,
    Team,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Participant => "participant",
            Role::Mentor => "mentor",
            Role::Host => "host",
            Role::Team => "team",
        }
    }
}

impl FromStr for Role {
    type Err = PlazaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "participant" => Ok(Role::Participant),
            "mentor" => Ok(Role::Mentor),
            "host" => Ok(Role::Host),
            "team" => Ok(Role::Team),
            other => Err(PlazaError::UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One enrolled user on a course. A member always holds at least one
/// role; entries left with zero roles are pruned on unsubscribe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseMember {
    pub user: Id<User>,
    pub roles: Vec<Role>,
    pub comment: Option<String>,
}

/// A proposed or running course.
///
/// `editors`, `interested`, `next_event`, `last_event`, `future_events`
/// and `tenant` are derived fields: seeded with a best-effort value at
/// creation and afterwards written only by the recomputation routines
/// in `denorm`, never by user-facing edits.
#[derive(Debug, Clone)]
pub struct Course {
    pub id: Id<Course>,
    pub name: String,
    pub region: Id<Region>,
    pub tenant: Option<Id<Tenant>>,
    /// Role keys this course offers for subscription.
    pub roles: Vec<Role>,
    pub members: Vec<CourseMember>,
    /// Groups whose organizers may edit this course.
    pub group_organizers: Vec<Id<Group>>,
    /// Groups promoting this course.
    pub groups: Vec<Id<Group>>,
    /// Derived: group-organizer ids plus team-member user ids.
    pub editors: Vec<Uuid>,
    /// Derived: members.len().
    pub interested: i64,
    pub next_event: Option<EventPointer>,
    pub last_event: Option<EventPointer>,
    pub future_events: i64,
    pub created_by: Id<User>,
    pub time_created: DateTime<Utc>,
    pub time_lastedit: DateTime<Utc>,
}

impl Course {
    pub fn create(
        name: String,
        region: Id<Region>,
        tenant: Option<Id<Tenant>>,
        roles: Vec<Role>,
        created_by: Id<User>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Id::generate(),
            name,
            region,
            tenant,
            roles,
            members: Vec::new(),
            group_organizers: Vec::new(),
            groups: Vec::new(),
            editors: Vec::new(),
            interested: 0,
            next_event: None,
            last_event: None,
            future_events: 0,
            created_by,
            time_created: now,
            time_lastedit: now,
        }
    }

    pub fn member(&self, user: Id<User>) -> Option<&CourseMember> {
        self.members.iter().find(|m| m.user == user)
    }

    pub fn user_has_role(&self, user: Id<User>, role: Role) -> bool {
        self.member(user).map_or(false, |m| m.roles.contains(&role))
    }

    /// User ids of all members holding the team role.
    pub fn team(&self) -> Vec<Id<User>> {
        self.members
            .iter()
            .filter(|m| m.roles.contains(&Role::Team))
            .map(|m| m.user)
            .collect()
    }

    /// The editors invariant: group organizers plus team-member users.
    pub fn compute_editors(&self) -> Vec<Uuid> {
        let organizers: Vec<Uuid> = self.group_organizers.iter().map(|g| g.value).collect();
        let team: Vec<Uuid> = self.team().iter().map(|u| u.value).collect();
        sets::union(&organizers, &team)
    }

    pub fn group_ids(&self) -> Vec<Uuid> {
        sets::canonical(self.groups.iter().map(|g| g.value).collect())
    }
}
