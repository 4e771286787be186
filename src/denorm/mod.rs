//! Recomputation routines for derived fields.
//!
//! Derived fields (course editors and interest counts, event group
//! inheritance, user badges and tenant links, region counters) are
//! never written by user-facing edits. The routines here re-derive them
//! from persisted primary state and apply the result through the
//! convergence loop in [`convergence`], so concurrent primary-field
//! writes are healed by simply running again.

pub mod convergence;
pub mod course_denorm;
pub mod event_denorm;
pub mod outbox;
pub mod region_denorm;
pub mod user_denorm;

pub use convergence::{converge, Outcome, StepResult};
pub use outbox::Trigger;
