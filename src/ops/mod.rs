use chrono::{DateTime, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::log_repo;
use crate::error::{PlazaError, PlazaResult};
use crate::model::User;

pub mod course_ops;
pub mod event_ops;
pub mod message;
pub mod subscribe;
pub mod unsubscribe;

pub use message::Message;
pub use subscribe::Subscribe;
pub use unsubscribe::Unsubscribe;

/// A validated, authorized, loggable unit of primary-state mutation.
///
/// `validate` checks business rules only; `permitted` checks
/// authorization only. Both are pure reads — a command rejected by
/// either has mutated nothing. `apply` performs several independent
/// atomic writes with no cross-write rollback; the recomputation
/// routines it triggers are idempotent, so a crash mid-apply self-heals
/// on the next trigger.
pub trait Command {
    /// Log stream name for the audit trail.
    fn track(&self) -> &'static str;
    /// Ids this command relates to, for the log entry.
    fn related(&self) -> Vec<Uuid>;
    /// What to log as the command body.
    fn body(&self) -> serde_json::Value;
    fn describe(&self) -> String;
    fn validate(&self, conn: &Connection) -> PlazaResult<()>;
    fn permitted(&self, conn: &Connection, actor: &User) -> PlazaResult<bool>;
    fn apply(&self, conn: &Connection, now: DateTime<Utc>) -> PlazaResult<()>;
}

/// Uniform dispatch sequence: validate → permitted → intent log →
/// apply → result log. Apply-time errors are logged with their detail
/// attached, then rethrown.
pub fn dispatch(
    conn: &Connection,
    actor: &User,
    command: &dyn Command,
    now: DateTime<Utc>,
) -> PlazaResult<()> {
    command.validate(conn)?;
    if !command.permitted(conn, actor)? {
        return Err(PlazaError::NotPermitted {
            action: command.describe(),
        });
    }

    let entry = log_repo::intent(conn, command.track(), &command.related(), &command.body(), now)?;
    tracing::debug!(track = command.track(), "applying command");
    match command.apply(conn, now) {
        Ok(()) => {
            log_repo::success(conn, entry, now)?;
            Ok(())
        }
        Err(err) => {
            log_repo::failure(conn, entry, &err.to_string(), now)?;
            Err(err)
        }
    }
}
