use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::db::{course_repo, event_repo};
use crate::error::{PlazaError, PlazaResult};
use crate::model::{sets, Course, Event, Id};

use super::convergence::{converge, Outcome, StepResult};

/// Recompute an event's `editors`, `course_groups` and `all_groups`.
///
/// Future events (`start >= now`) inherit the parent course's current
/// promoting groups. Past events are frozen: their stored
/// `course_groups` is left untouched and `all_groups` is rebuilt from
/// that stored value, so later edits to the course never rewrite
/// history. A missing parent course is a data-integrity violation and
/// aborts with an error rather than converging.
pub fn update_groups(
    conn: &Connection,
    event_id: Id<Event>,
    now: DateTime<Utc>,
) -> PlazaResult<Outcome> {
    converge(|| {
        let Some(event) = event_repo::find_by_id(conn, event_id)? else {
            return Ok(StepResult::Missing);
        };

        let mut editors: Vec<_> = event.group_organizers.iter().map(|g| g.value).collect();
        let course_groups_fresh = match event.course_id {
            Some(course_id) => {
                let course = course_repo::find_by_id(conn, course_id)?
                    .ok_or_else(|| PlazaError::not_found("Course", course_id))?;
                editors = sets::union(&editors, &course.editors);
                course.group_ids()
            }
            None => {
                editors = sets::union(&editors, &[event.created_by.value]);
                Vec::new()
            }
        };

        let wrote = if event.is_past(now) {
            // Historical freeze: rebuild all_groups from the stored
            // inheritance and leave course_groups alone.
            let all_groups = sets::union(&event.group_ids(), &event.course_group_ids());
            event_repo::set_derived_if_changed(conn, event_id, &editors, None, &all_groups)?
        } else {
            let all_groups = sets::union(&event.group_ids(), &course_groups_fresh);
            event_repo::set_derived_if_changed(
                conn,
                event_id,
                &editors,
                Some(&course_groups_fresh),
                &all_groups,
            )?
        };

        if wrote {
            Ok(StepResult::Wrote)
        } else {
            Ok(StepResult::Clean)
        }
    })
}

/// Run [`update_groups`] for every event under a course. This is what
/// the `EventUpdateGroups` outbox trigger executes.
pub fn update_groups_for_course(
    conn: &Connection,
    course_id: Id<Course>,
    now: DateTime<Utc>,
) -> PlazaResult<()> {
    for event_id in event_repo::ids_by_course(conn, course_id)? {
        update_groups(conn, event_id, now)?;
    }
    Ok(())
}
