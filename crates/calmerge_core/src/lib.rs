//! Core domain logic for calmerge.
//! Events, users, and the consolidation of overlapping events.

pub mod db;
pub mod logging;
pub mod merge;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogSettings};
pub use merge::{consolidate, consolidate_with, overlaps, MergeResult};
pub use model::event::{Event, EventId, EventStatus, EventValidationError};
pub use model::user::{User, UserId, UserWithEvents};
pub use repo::event_repo::{EventRepository, RepoError, RepoResult, SqliteEventRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use service::event_service::{CreateEventRequest, EventService, EventServiceError};
pub use service::user_service::{UserService, UserServiceError};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
