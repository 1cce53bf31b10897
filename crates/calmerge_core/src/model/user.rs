//! User domain model.

use crate::model::event::EventId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a user.
pub type UserId = Uuid;

/// A person who can attend events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Display name, free text.
    pub name: String,
}

impl User {
    /// Creates a user with a generated stable ID.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    /// Creates a user with a caller-provided ID.
    pub fn with_id(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Read model joining a user with the events they attend.
///
/// `event_ids` is derived from attendee links at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserWithEvents {
    pub user: User,
    /// Attended events ordered by start time.
    pub event_ids: Vec<EventId>,
}
