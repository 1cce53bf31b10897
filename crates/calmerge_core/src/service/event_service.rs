//! Event use-case service.
//!
//! # Responsibility
//! - Validate event creation requests before they reach storage.
//! - Run the merge-all use case: snapshot, consolidate, commit.
//!
//! # Invariants
//! - Merge commits persist every new representative before deleting any
//!   superseded event; deletion happens once, as a single set.
//! - Callers serialize merges for the same owner; this service takes no
//!   lock of its own.

use crate::merge::consolidate;
use crate::model::event::{Event, EventId, EventStatus, EventValidationError};
use crate::model::user::UserId;
use crate::repo::event_repo::{EventRepository, RepoError};
use crate::repo::user_repo::UserRepository;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for event use-cases.
#[derive(Debug)]
pub enum EventServiceError {
    /// Request violates an event invariant.
    Validation(EventValidationError),
    EventNotFound(EventId),
    UserNotFound(UserId),
    /// A requested invitee does not exist.
    InviteeNotFound(UserId),
    /// Some representatives were saved but the merge did not complete.
    ///
    /// Storage holds `persisted` next to every original event; delete
    /// `persisted` before retrying the merge.
    PartialMerge {
        persisted: Vec<EventId>,
        source: RepoError,
    },
    Repo(RepoError),
    /// Write succeeded but read-back disagrees.
    InconsistentState(&'static str),
}

impl Display for EventServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::EventNotFound(id) => write!(f, "event not found: {id}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::InviteeNotFound(id) => write!(f, "invitee not found: {id}"),
            Self::PartialMerge { persisted, source } => write!(
                f,
                "merge saved {} event(s) before failing: {source}",
                persisted.len()
            ),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent event state: {details}"),
        }
    }
}

impl Error for EventServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::PartialMerge { source, .. } => Some(source),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for EventServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<EventValidationError> for EventServiceError {
    fn from(value: EventValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Request model for creating one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub status: EventStatus,
    /// Epoch milliseconds; must be before `end_ms`.
    pub start_ms: i64,
    pub end_ms: i64,
    /// Attendee IDs; duplicates are ignored.
    pub invitee_ids: Vec<UserId>,
}

/// Event service facade over event and user repositories.
pub struct EventService<E: EventRepository, U: UserRepository> {
    events: E,
    users: U,
}

impl<E: EventRepository, U: UserRepository> EventService<E, U> {
    pub fn new(events: E, users: U) -> Self {
        Self { events, users }
    }

    /// Creates an event after validating its range and invitees.
    ///
    /// # Errors
    /// - `Validation` when `start_ms >= end_ms`.
    /// - `InviteeNotFound` for the first unknown invitee.
    pub fn create_event(&self, request: &CreateEventRequest) -> Result<Event, EventServiceError> {
        let mut event = Event::new(request.title.clone(), request.start_ms, request.end_ms);
        event.description = request.description.clone();
        event.status = request.status;
        event.validate()?;

        for invitee_id in &request.invitee_ids {
            // Repeated ids are looked up once.
            if event.has_attendee(*invitee_id) {
                continue;
            }
            let user = self
                .users
                .get_user(*invitee_id)?
                .ok_or(EventServiceError::InviteeNotFound(*invitee_id))?;
            event.add_attendee(user);
        }

        let id = self.events.create_event(&event)?;
        let stored = self
            .events
            .get_event(id)?
            .ok_or(EventServiceError::InconsistentState(
                "created event not found in read-back",
            ))?;
        info!(
            "event=event_create module=service status=ok attendees={}",
            stored.attendees.len()
        );
        Ok(stored)
    }

    pub fn get_event(&self, id: EventId) -> Result<Event, EventServiceError> {
        self.events
            .get_event(id)?
            .ok_or(EventServiceError::EventNotFound(id))
    }

    pub fn remove_event(&self, id: EventId) -> Result<(), EventServiceError> {
        match self.events.delete_event(id) {
            Ok(()) => Ok(()),
            Err(RepoError::NotFound(_)) => Err(EventServiceError::EventNotFound(id)),
            Err(err) => Err(err.into()),
        }
    }

    /// Merges every run of overlapping events attended by `user_id`.
    ///
    /// Returns the user's resulting events ordered by start time.
    ///
    /// # Errors
    /// - `UserNotFound` when the user does not exist.
    /// - `PartialMerge` when a save or the final deletion fails after at least
    ///   one representative was saved; `persisted` lists what is now stored.
    pub fn merge_all_overlapping_events(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Event>, EventServiceError> {
        let started_at = Instant::now();

        if self.users.get_user(user_id)?.is_none() {
            return Err(EventServiceError::UserNotFound(user_id));
        }

        let snapshot = self.events.list_events_for_owner(user_id)?;
        let input_count = snapshot.len();
        let result = consolidate(snapshot);
        if !result.has_merges() {
            return Ok(result.output);
        }

        let mut persisted = Vec::with_capacity(result.representatives.len());
        for event in result.new_events() {
            match self.events.persist_event(event) {
                Ok(id) => persisted.push(id),
                Err(source) if persisted.is_empty() => return Err(source.into()),
                Err(source) => return Err(partial_merge(user_id, persisted, source)),
            }
        }

        if let Err(source) = self.events.delete_events(&result.superseded) {
            return Err(partial_merge(user_id, persisted, source));
        }

        info!(
            "event=merge_all module=service status=ok owner={user_id} input={input_count} output={} superseded={} duration_ms={}",
            result.output.len(),
            result.superseded.len(),
            started_at.elapsed().as_millis()
        );
        Ok(result.output)
    }
}

fn partial_merge(user_id: UserId, persisted: Vec<EventId>, source: RepoError) -> EventServiceError {
    error!(
        "event=merge_all module=service status=error owner={user_id} persisted={} error={source}",
        persisted.len()
    );
    EventServiceError::PartialMerge { persisted, source }
}
