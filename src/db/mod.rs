use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::error::{PlazaError, PlazaResult};
use crate::model::{sets, Id};

pub mod schema;

pub mod course_repo;
pub mod event_repo;
pub mod group_repo;
pub mod log_repo;
pub mod notification_repo;
pub mod outbox_repo;
pub mod region_repo;
pub mod tenant_repo;
pub mod user_repo;

/// Serialize an id set to its canonical JSON column form (sorted,
/// deduplicated), so equal sets always compare equal as text.
pub(crate) fn ids_to_json(ids: &[Uuid]) -> PlazaResult<String> {
    Ok(serde_json::to_string(&sets::canonical(ids.to_vec()))?)
}

pub(crate) fn ids_from_json(json: &str) -> PlazaResult<Vec<Uuid>> {
    Ok(serde_json::from_str(json)?)
}

pub(crate) fn typed_ids_to_json<T>(ids: &[Id<T>]) -> PlazaResult<String> {
    let raw: Vec<Uuid> = ids.iter().map(|id| id.value).collect();
    ids_to_json(&raw)
}

pub(crate) fn typed_ids_from_json<T>(json: &str) -> PlazaResult<Vec<Id<T>>> {
    Ok(ids_from_json(json)?.into_iter().map(Id::new).collect())
}

pub(crate) fn parse_id<T>(s: &str) -> PlazaResult<Id<T>> {
    Id::parse(s).map_err(|e| PlazaError::Other(format!("Invalid UUID: {}", e)))
}

/// Timestamps are stored as fixed-width UTC RFC 3339 text
/// ("2026-01-01T09:00:00.000Z") so lexicographic comparison in SQL is
/// chronological comparison.
pub(crate) fn fmt_time(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_time(s: &str) -> PlazaResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PlazaError::Other(format!("Invalid timestamp: {}", e)))
}
