use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::db::{course_repo, region_repo};
use crate::denorm::outbox::{self, Trigger};
use crate::error::{PlazaError, PlazaResult};
use crate::model::{Course, Id, Region, Role, User};
use crate::validation;

/// Create a course. Derived fields get their best-effort initial values
/// here (`tenant` from the region, empty editors, zero counts); the
/// recomputation routines own them from then on.
pub fn create_course(
    conn: &Connection,
    name: &str,
    region_id: Id<Region>,
    roles: Vec<Role>,
    created_by: Id<User>,
    now: DateTime<Utc>,
) -> PlazaResult<Course> {
    let valid_name = validation::non_blank(name, "name")?;
    let region = region_repo::find_by_id(conn, region_id)?
        .ok_or_else(|| PlazaError::not_found("Region", region_id))?;

    let course = Course::create(
        valid_name,
        region.id,
        Some(region.tenant),
        roles,
        created_by,
        now,
    );
    course_repo::insert(conn, &course)?;

    outbox::enqueue(
        conn,
        &Trigger::RegionUpdateCounters {
            region: Some(region.id),
        },
        now,
    )?;

    Ok(course)
}
