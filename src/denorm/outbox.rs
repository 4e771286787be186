use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::outbox_repo;
use crate::error::PlazaResult;
use crate::model::{Course, Id, Region, User};

use super::{course_denorm, event_denorm, region_denorm, user_denorm};

/// A deferred recompute call. Commands and creation ops enqueue these
/// instead of invoking the routines across an async boundary; `drain`
/// executes them later. `None` selectors mean "all documents".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Trigger {
    EventUpdateGroups { course: Id<Course> },
    CourseUpdateGroups { course: Id<Course> },
    CourseUpdateNextEvent { course: Option<Id<Course>> },
    RegionUpdateCounters { region: Option<Id<Region>> },
    UserUpdateBadges { user: Id<User> },
}

pub fn enqueue(conn: &Connection, trigger: &Trigger, now: DateTime<Utc>) -> PlazaResult<i64> {
    let payload = serde_json::to_string(trigger)?;
    tracing::debug!(%payload, "trigger enqueued");
    outbox_repo::enqueue(conn, &payload, now)
}

/// Execute the snapshot of currently-pending triggers and mark them
/// done. Triggers enqueued while draining (e.g. the course → event
/// cascade) stay pending for the next call. Returns how many triggers
/// ran. An execution error leaves the failing trigger pending and
/// propagates.
pub fn drain(conn: &Connection, now: DateTime<Utc>) -> PlazaResult<usize> {
    let pending = outbox_repo::pending(conn)?;
    let count = pending.len();
    for (id, payload) in pending {
        let trigger: Trigger = serde_json::from_str(&payload)?;
        run(conn, &trigger, now)?;
        outbox_repo::mark_done(conn, id)?;
    }
    tracing::debug!(count, "outbox drained");
    Ok(count)
}

fn run(conn: &Connection, trigger: &Trigger, now: DateTime<Utc>) -> PlazaResult<()> {
    match trigger {
        Trigger::EventUpdateGroups { course } => {
            event_denorm::update_groups_for_course(conn, *course, now)
        }
        Trigger::CourseUpdateGroups { course } => {
            course_denorm::update_groups(conn, *course).map(|_| ())
        }
        Trigger::CourseUpdateNextEvent { course: Some(course) } => {
            course_denorm::update_next_event(conn, *course, now)
        }
        Trigger::CourseUpdateNextEvent { course: None } => {
            course_denorm::sweep_next_events(conn, now)
        }
        Trigger::RegionUpdateCounters { region: Some(region) } => {
            region_denorm::update_counters(conn, *region, now).map(|_| ())
        }
        Trigger::RegionUpdateCounters { region: None } => {
            region_denorm::update_all_counters(conn, now)
        }
        Trigger::UserUpdateBadges { user } => {
            user_denorm::update_badges(conn, *user).map(|_| ())
        }
    }
}
