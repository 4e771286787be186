use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde_json::json;
use uuid::Uuid;

use crate::db::{course_repo, event_repo};
use crate::denorm::course_denorm;
use crate::error::{PlazaError, PlazaResult};
use crate::model::{Course, Id, Role, User};

use super::Command;

/// Remove a role from a user's course membership.
pub struct Unsubscribe {
    pub course: Id<Course>,
    pub user: Id<User>,
    pub role: Role,
}

impl Unsubscribe {
    pub fn new(course: Id<Course>, user: Id<User>, role: Role) -> Self {
        Self { course, user, role }
    }

    fn load_course(&self, conn: &Connection) -> PlazaResult<Course> {
        course_repo::find_by_id(conn, self.course)?
            .ok_or_else(|| PlazaError::not_found("Course", self.course))
    }
}

impl Command for Unsubscribe {
    fn track(&self) -> &'static str {
        "course.unsubscribe"
    }

    fn related(&self) -> Vec<Uuid> {
        vec![self.course.value, self.user.value]
    }

    fn body(&self) -> serde_json::Value {
        json!({
            "course": self.course,
            "user": self.user,
            "role": self.role,
        })
    }

    fn describe(&self) -> String {
        format!(
            "unsubscribe user {} from role {} on course {}",
            self.user, self.role, self.course
        )
    }

    fn validate(&self, conn: &Connection) -> PlazaResult<()> {
        let course = self.load_course(conn)?;
        if !course.user_has_role(self.user, self.role) {
            return Err(PlazaError::NotSubscribed {
                user: self.user.to_string(),
                role: self.role.to_string(),
            });
        }
        Ok(())
    }

    fn permitted(&self, conn: &Connection, actor: &User) -> PlazaResult<bool> {
        if actor.is_admin() {
            return Ok(true);
        }
        let course = self.load_course(conn)?;

        if self.role == Role::Team {
            // Any team member may remove any other team member.
            return Ok(course.team().contains(&actor.id));
        }

        Ok(actor.id == self.user)
    }

    fn apply(&self, conn: &Connection, now: DateTime<Utc>) -> PlazaResult<()> {
        course_repo::remove_member_role(conn, self.course, self.user, self.role)?;

        if self.role == Role::Team {
            // Direct cascade so edit rights drop immediately; the
            // enqueued recompute re-derives the full lists anyway.
            course_repo::pull_editor(conn, self.course, self.user)?;
            for event_id in event_repo::ids_by_course(conn, self.course)? {
                event_repo::pull_editor(conn, event_id, self.user)?;
            }
        }

        course_repo::prune_memberless(conn, self.course)?;

        course_denorm::update_interested(conn, self.course)?;
        course_denorm::update_groups(conn, self.course)?;
        course_repo::touch(conn, self.course, now)?;
        course_repo::add_history(
            conn,
            self.course,
            "userUnsubscribed",
            self.user,
            Some(&json!({ "role": self.role })),
            now,
        )?;
        Ok(())
    }
}
