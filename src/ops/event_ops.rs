use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::db::{course_repo, event_repo, region_repo};
use crate::denorm::outbox::{self, Trigger};
use crate::denorm::event_denorm;
use crate::error::{PlazaError, PlazaResult};
use crate::model::{Course, Event, Id, Region, User};
use crate::validation;

/// Create an event. The group/editor inheritance is derived right after
/// insert by the regular recompute routine, so creation and later
/// convergence share one code path; region counters and the course's
/// event pointers refresh via the outbox.
pub fn create_event(
    conn: &Connection,
    title: &str,
    region_id: Id<Region>,
    course_id: Option<Id<Course>>,
    created_by: Id<User>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> PlazaResult<Event> {
    let valid_title = validation::non_blank(title, "title")?;
    let region = region_repo::find_by_id(conn, region_id)?
        .ok_or_else(|| PlazaError::not_found("Region", region_id))?;
    if let Some(course_id) = course_id {
        if course_repo::find_by_id(conn, course_id)?.is_none() {
            return Err(PlazaError::not_found("Course", course_id));
        }
    }

    let event = Event::create(
        valid_title,
        region.id,
        Some(region.tenant),
        course_id,
        created_by,
        start,
        end,
    );
    event_repo::insert(conn, &event)?;
    event_denorm::update_groups(conn, event.id, now)?;

    outbox::enqueue(
        conn,
        &Trigger::RegionUpdateCounters {
            region: Some(region.id),
        },
        now,
    )?;
    if let Some(course_id) = course_id {
        outbox::enqueue(
            conn,
            &Trigger::CourseUpdateNextEvent {
                course: Some(course_id),
            },
            now,
        )?;
    }

    event_repo::find_by_id(conn, event.id)?
        .ok_or_else(|| PlazaError::not_found("Event", event.id))
}
