use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde_json::json;
use uuid::Uuid;

use crate::db::{course_repo, notification_repo, user_repo};
use crate::denorm::course_denorm;
use crate::error::{PlazaError, PlazaResult};
use crate::model::{Course, Id, Role, User};
use crate::validation::trim_optional;

use super::Command;

/// Subscribe a user to a role on a course.
pub struct Subscribe {
    pub course: Id<Course>,
    pub user: Id<User>,
    pub role: Role,
    pub comment: Option<String>,
}

impl Subscribe {
    pub fn new(course: Id<Course>, user: Id<User>, role: Role, comment: Option<&str>) -> Self {
        Self {
            course,
            user,
            role,
            comment: trim_optional(comment),
        }
    }

    fn load_course(&self, conn: &Connection) -> PlazaResult<Course> {
        course_repo::find_by_id(conn, self.course)?
            .ok_or_else(|| PlazaError::not_found("Course", self.course))
    }
}

impl Command for Subscribe {
    fn track(&self) -> &'static str {
        "course.subscribe"
    }

    fn related(&self) -> Vec<Uuid> {
        vec![self.course.value, self.user.value]
    }

    fn body(&self) -> serde_json::Value {
        json!({
            "course": self.course,
            "user": self.user,
            "role": self.role,
            "comment": self.comment,
        })
    }

    fn describe(&self) -> String {
        format!(
            "subscribe user {} to course {} as {}",
            self.user, self.course, self.role
        )
    }

    fn validate(&self, conn: &Connection) -> PlazaResult<()> {
        let course = self.load_course(conn)?;
        if user_repo::find_by_id(conn, self.user)?.is_none() {
            return Err(PlazaError::not_found("User", self.user));
        }
        if !course.roles.contains(&self.role) {
            return Err(PlazaError::RoleNotOffered {
                role: self.role.to_string(),
            });
        }
        if course.user_has_role(self.user, self.role) {
            return Err(PlazaError::AlreadySubscribed {
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
            let team = course.team();
            if team.is_empty() {
                // Team bootstrap: anyone may claim the team role for
                // themselves on a teamless course.
                return Ok(actor.id == self.user);
            }
            // Established team: only team members act, and only to
            // draft users already involved with the course.
            let drafted = [Role::Participant, Role::Mentor, Role::Host]
                .iter()
                .any(|r| course.user_has_role(self.user, *r));
            return Ok(team.contains(&actor.id) && drafted);
        }

        Ok(actor.id == self.user)
    }

    fn apply(&self, conn: &Connection, now: DateTime<Utc>) -> PlazaResult<()> {
        // Member entry first, role right after: a member never persists
        // with an empty role list.
        course_repo::add_member(conn, self.course, self.user)?;
        course_repo::add_member_role(conn, self.course, self.user, self.role)?;
        if let Some(comment) = &self.comment {
            course_repo::set_member_comment(conn, self.course, self.user, Some(comment))?;
        }

        course_denorm::update_interested(conn, self.course)?;
        course_denorm::update_groups(conn, self.course)?;
        course_repo::touch(conn, self.course, now)?;
        course_repo::add_history(
            conn,
            self.course,
            "userSubscribed",
            self.user,
            Some(&json!({ "role": self.role })),
            now,
        )?;
        notification_repo::record_join(
            conn,
            self.course,
            self.user,
            self.role,
            self.comment.as_deref(),
            now,
        )?;
        Ok(())
    }
}
