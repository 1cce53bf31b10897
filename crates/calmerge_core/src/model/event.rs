//! Event domain model.
//!
//! # Responsibility
//! - Define the canonical calendar event record.
//! - Provide the status priority used when merging events.
//!
//! # Invariants
//! - `id` is stable and never reused for another event.
//! - `start_ms < end_ms` for every persisted event.
//! - `attendees` holds at most one entry per `UserId`.

use crate::model::user::{User, UserId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of an event.
pub type EventId = Uuid;

/// Progress state of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    /// Not started yet.
    #[default]
    Todo,
    /// Currently being worked on.
    InProgress,
    /// Finished.
    Completed,
}

impl EventStatus {
    /// Merge priority: a merged event takes the highest priority present.
    ///
    /// `InProgress` > `Todo` > `Completed`.
    pub fn priority(self) -> u8 {
        match self {
            Self::InProgress => 3,
            Self::Todo => 2,
            Self::Completed => 1,
        }
    }

    /// Stable lowercase name used for storage and CLI input.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    /// Parses a storage/CLI name, accepting either case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "todo" => Some(Self::Todo),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Event invariant violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventValidationError {
    /// Nil UUID is reserved and cannot identify an event.
    NilId,
    /// Start is not strictly before end.
    InvalidTimeRange { start_ms: i64, end_ms: i64 },
}

impl Display for EventValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "event id must not be nil"),
            Self::InvalidTimeRange { start_ms, end_ms } => write!(
                f,
                "start time must be before end time (start_ms={start_ms}, end_ms={end_ms})"
            ),
        }
    }
}

impl Error for EventValidationError {}

/// Calendar event attended by one or more users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: Option<String>,
    pub status: EventStatus,
    /// Unix epoch milliseconds, inclusive.
    pub start_ms: i64,
    /// Unix epoch milliseconds, exclusive.
    pub end_ms: i64,
    pub attendees: Vec<User>,
}

impl Event {
    /// Creates a `Todo` event with a generated ID and no attendees.
    ///
    /// Does not validate the time range; call [`Event::validate`] before
    /// persisting.
    pub fn new(title: impl Into<String>, start_ms: i64, end_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            status: EventStatus::default(),
            start_ms,
            end_ms,
            attendees: Vec::new(),
        }
    }

    /// Creates an event with a caller-provided ID.
    ///
    /// Used by storage and tests where identity already exists.
    pub fn with_id(
        id: EventId,
        title: impl Into<String>,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Self, EventValidationError> {
        if id.is_nil() {
            return Err(EventValidationError::NilId);
        }
        let mut event = Self::new(title, start_ms, end_ms);
        event.id = id;
        Ok(event)
    }

    /// Checks the invariants required before persistence.
    pub fn validate(&self) -> Result<(), EventValidationError> {
        if self.id.is_nil() {
            return Err(EventValidationError::NilId);
        }
        if self.start_ms >= self.end_ms {
            return Err(EventValidationError::InvalidTimeRange {
                start_ms: self.start_ms,
                end_ms: self.end_ms,
            });
        }
        Ok(())
    }

    /// Returns whether `user_id` is among the attendees.
    pub fn has_attendee(&self, user_id: UserId) -> bool {
        self.attendees.iter().any(|user| user.id == user_id)
    }

    /// Adds an attendee unless one with the same ID is already present.
    pub fn add_attendee(&mut self, user: User) {
        if !self.has_attendee(user.id) {
            self.attendees.push(user);
        }
    }
}
