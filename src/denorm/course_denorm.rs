use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::db::course_repo;
use crate::error::PlazaResult;
use crate::model::{Course, Id};
use crate::queries::event_queries;

use super::convergence::{converge, Outcome, StepResult};
use super::outbox::{self, Trigger};

/// Recompute `interested = members.len()`. No-op if the course is gone.
pub fn update_interested(conn: &Connection, course_id: Id<Course>) -> PlazaResult<Outcome> {
    converge(|| {
        let Some(course) = course_repo::find_by_id(conn, course_id)? else {
            return Ok(StepResult::Missing);
        };
        let interested = course.members.len() as i64;
        if course_repo::set_interested_if_changed(conn, course_id, interested)? {
            Ok(StepResult::Wrote)
        } else {
            Ok(StepResult::Clean)
        }
    })
}

/// Recompute `editors = group_organizers ∪ {team members}`. Once clean,
/// the sibling recompute for all events under this course is enqueued
/// on the outbox; the caller does not wait for it.
pub fn update_groups(conn: &Connection, course_id: Id<Course>) -> PlazaResult<Outcome> {
    let outcome = converge(|| {
        let Some(course) = course_repo::find_by_id(conn, course_id)? else {
            return Ok(StepResult::Missing);
        };
        let editors = course.compute_editors();
        if course_repo::set_editors_if_changed(conn, course_id, &editors)? {
            Ok(StepResult::Wrote)
        } else {
            Ok(StepResult::Clean)
        }
    })?;

    if let Outcome::Converged { .. } = outcome {
        outbox::enqueue(conn, &Trigger::EventUpdateGroups { course: course_id }, Utc::now())?;
        tracing::debug!(course = %course_id, "course editors converged, event recompute enqueued");
    }
    Ok(outcome)
}

/// Refresh the `next_event` / `last_event` projections and the future
/// event count with a direct last-write-wins set. This family bypasses
/// the convergence loop: the values are cheap to recompute and brief
/// staleness is acceptable until the next sweep.
pub fn update_next_event(
    conn: &Connection,
    course_id: Id<Course>,
    now: DateTime<Utc>,
) -> PlazaResult<()> {
    if course_repo::find_by_id(conn, course_id)?.is_none() {
        return Ok(());
    }

    let future = event_queries::future_pointers(conn, course_id, now)?;
    let last = event_queries::last_pointer(conn, course_id, now)?;
    course_repo::set_event_pointers(
        conn,
        course_id,
        future.first(),
        last.as_ref(),
        future.len() as i64,
    )
}

/// Periodic sweep over all courses.
pub fn sweep_next_events(conn: &Connection, now: DateTime<Utc>) -> PlazaResult<()> {
    for course_id in course_repo::all_ids(conn)? {
        update_next_event(conn, course_id, now)?;
    }
    Ok(())
}
