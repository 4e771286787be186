pub mod ids;
pub mod sets;
pub mod user;
pub mod group;
pub mod tenant;
pub mod region;
pub mod course;
pub mod event;

// Re-exports for convenience
pub use course::{Course, CourseMember, Role};
pub use event::{Event, EventPointer};
pub use group::Group;
pub use ids::Id;
pub use region::Region;
pub use tenant::Tenant;
pub use user::{TenantLink, User};
