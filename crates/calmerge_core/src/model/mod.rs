//! Calendar domain model.
//!
//! # Responsibility
//! - Define the event and user records shared by merge, repository and
//!   service layers.
//!
//! # Invariants
//! - Every event and user is identified by a stable v4 UUID.
//! - An event's `start_ms` is strictly earlier than its `end_ms`.
//! - The user -> events relation is derived from attendee links, never owned
//!   by `User`.

pub mod event;
pub mod user;
