use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::db::{course_repo, event_repo, region_repo};
use crate::error::PlazaResult;
use crate::model::{Id, Region};

use super::convergence::{converge, Outcome, StepResult};

/// Recompute a region's `course_count` and `future_event_count`.
pub fn update_counters(
    conn: &Connection,
    region_id: Id<Region>,
    now: DateTime<Utc>,
) -> PlazaResult<Outcome> {
    converge(|| {
        if region_repo::find_by_id(conn, region_id)?.is_none() {
            return Ok(StepResult::Missing);
        }
        let course_count = course_repo::count_by_region(conn, region_id)?;
        let future_event_count = event_repo::count_future_by_region(conn, region_id, now)?;
        if region_repo::set_counters_if_changed(conn, region_id, course_count, future_event_count)? {
            Ok(StepResult::Wrote)
        } else {
            Ok(StepResult::Clean)
        }
    })
}

/// Sweep over all regions.
pub fn update_all_counters(conn: &Connection, now: DateTime<Utc>) -> PlazaResult<()> {
    for region_id in region_repo::all_ids(conn)? {
        update_counters(conn, region_id, now)?;
    }
    Ok(())
}
