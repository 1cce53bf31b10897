//! Repository layer: storage contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the read/write collaborators used by services.
//! - Keep SQL details behind the repository boundary.
//!
//! # Invariants
//! - Event writes enforce `Event::validate()` before persistence.
//! - Repositories only accept fully migrated connections.

pub mod event_repo;
pub mod user_repo;
