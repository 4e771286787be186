use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde_json::json;
use uuid::Uuid;

use crate::db::course_repo;
use crate::error::PlazaResult;
use crate::model::{Course, Id, User};
use crate::validation::trim_optional;

use super::Command;

/// Set the comment on a user's own member entry. Triggers no
/// recomputation; the comment is not a derived input.
pub struct Message {
    pub course: Id<Course>,
    pub user: Id<User>,
    pub text: Option<String>,
}

impl Message {
    pub fn new(course: Id<Course>, user: Id<User>, text: &str) -> Self {
        Self {
            course,
            user,
            text: trim_optional(Some(text)),
        }
    }
}

impl Command for Message {
    fn track(&self) -> &'static str {
        "course.message"
    }

    fn related(&self) -> Vec<Uuid> {
        vec![self.course.value, self.user.value]
    }

    fn body(&self) -> serde_json::Value {
        json!({
            "course": self.course,
            "user": self.user,
            "text": self.text,
        })
    }

    fn describe(&self) -> String {
        format!("set comment of user {} on course {}", self.user, self.course)
    }

    fn validate(&self, _conn: &Connection) -> PlazaResult<()> {
        Ok(())
    }

    fn permitted(&self, _conn: &Connection, actor: &User) -> PlazaResult<bool> {
        // Only the comment's owner; no admin bypass.
        Ok(actor.id == self.user)
    }

    fn apply(&self, conn: &Connection, _now: DateTime<Utc>) -> PlazaResult<()> {
        course_repo::set_member_comment(conn, self.course, self.user, self.text.as_deref())?;
        Ok(())
    }
}
