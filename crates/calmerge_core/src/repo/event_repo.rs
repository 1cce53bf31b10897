//! Event repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Read and write events together with their attendee links.
//! - Serve as the read/write collaborator of the merge use case.
//!
//! # Invariants
//! - Write paths call `Event::validate()` before any SQL mutation.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - Owner listings are ordered by `start_ms ASC`, then insertion order, so
//!   equal-start events reach the consolidator in a deterministic order.
//! - Multi-row writes run in one immediate transaction.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::event::{Event, EventId, EventStatus, EventValidationError};
use crate::model::user::{User, UserId};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const EVENT_SELECT_SQL: &str = "SELECT
    e.uuid AS uuid,
    e.title AS title,
    e.description AS description,
    e.status AS status,
    e.start_ms AS start_ms,
    e.end_ms AS end_ms
FROM events e";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by event and user persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(EventValidationError),
    Db(DbError),
    /// Target event or user does not exist.
    NotFound(Uuid),
    /// Connection schema is not at the version this build expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EventValidationError> for RepoError {
    fn from(value: EventValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage contract for events.
pub trait EventRepository {
    /// Inserts a new event; fails if the ID is already taken.
    fn create_event(&self, event: &Event) -> RepoResult<EventId>;
    /// Inserts or fully replaces an event, attendee links included.
    fn persist_event(&self, event: &Event) -> RepoResult<EventId>;
    fn get_event(&self, id: EventId) -> RepoResult<Option<Event>>;
    /// Every event where `owner` is an attendee, fully populated.
    fn list_events_for_owner(&self, owner: UserId) -> RepoResult<Vec<Event>>;
    fn delete_event(&self, id: EventId) -> RepoResult<()>;
    /// Removes exactly `events`, or nothing if any of them is missing.
    fn delete_events(&self, events: &[Event]) -> RepoResult<()>;
}

/// SQLite-backed event repository.
pub struct SqliteEventRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEventRepository<'conn> {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema is not at the latest
    ///   version (use `db::open_db*` to obtain connections).
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl EventRepository for SqliteEventRepository<'_> {
    fn create_event(&self, event: &Event) -> RepoResult<EventId> {
        event.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO events (
                uuid,
                title,
                description,
                status,
                start_ms,
                end_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                event.id.to_string(),
                event.title.as_str(),
                event.description.as_deref(),
                event.status.as_str(),
                event.start_ms,
                event.end_ms,
            ],
        )?;
        write_attendees(&tx, event)?;
        tx.commit()?;

        Ok(event.id)
    }

    fn persist_event(&self, event: &Event) -> RepoResult<EventId> {
        event.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO events (
                uuid,
                title,
                description,
                status,
                start_ms,
                end_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(uuid) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                status = excluded.status,
                start_ms = excluded.start_ms,
                end_ms = excluded.end_ms,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                event.id.to_string(),
                event.title.as_str(),
                event.description.as_deref(),
                event.status.as_str(),
                event.start_ms,
                event.end_ms,
            ],
        )?;
        tx.execute(
            "DELETE FROM event_attendees WHERE event_uuid = ?1;",
            [event.id.to_string()],
        )?;
        write_attendees(&tx, event)?;
        tx.commit()?;

        Ok(event.id)
    }

    fn get_event(&self, id: EventId) -> RepoResult<Option<Event>> {
        let row = self
            .conn
            .query_row(
                &format!("{EVENT_SELECT_SQL} WHERE e.uuid = ?1;"),
                [id.to_string()],
                EventRow::from_row,
            )
            .optional()?;

        row.map(|row| row.into_event(self.conn)).transpose()
    }

    fn list_events_for_owner(&self, owner: UserId) -> RepoResult<Vec<Event>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EVENT_SELECT_SQL}
             JOIN event_attendees a ON a.event_uuid = e.uuid
             WHERE a.user_uuid = ?1
             ORDER BY e.start_ms ASC, e.rowid ASC;"
        ))?;
        let rows = stmt
            .query_map([owner.to_string()], EventRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|row| row.into_event(self.conn))
            .collect()
    }

    fn delete_event(&self, id: EventId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM events WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn delete_events(&self, events: &[Event]) -> RepoResult<()> {
        if events.is_empty() {
            return Ok(());
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for event in events {
            let changed = tx.execute(
                "DELETE FROM events WHERE uuid = ?1;",
                [event.id.to_string()],
            )?;
            if changed == 0 {
                // Dropping `tx` rolls back the deletions done so far.
                return Err(RepoError::NotFound(event.id));
            }
        }
        tx.commit()?;
        Ok(())
    }
}

/// Raw `events` row before attendee hydration.
struct EventRow {
    uuid: String,
    title: String,
    description: Option<String>,
    status: String,
    start_ms: i64,
    end_ms: i64,
}

impl EventRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            uuid: row.get("uuid")?,
            title: row.get("title")?,
            description: row.get("description")?,
            status: row.get("status")?,
            start_ms: row.get("start_ms")?,
            end_ms: row.get("end_ms")?,
        })
    }

    fn into_event(self, conn: &Connection) -> RepoResult<Event> {
        let id = parse_uuid(&self.uuid, "events.uuid")?;
        let status = EventStatus::parse(&self.status).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid status `{}` in events.status", self.status))
        })?;

        let event = Event {
            id,
            title: self.title,
            description: self.description,
            status,
            start_ms: self.start_ms,
            end_ms: self.end_ms,
            attendees: load_attendees(conn, &self.uuid)?,
        };
        event.validate()?;
        Ok(event)
    }
}

fn load_attendees(conn: &Connection, event_uuid: &str) -> RepoResult<Vec<User>> {
    let mut stmt = conn.prepare(
        "SELECT u.uuid, u.name
         FROM event_attendees a
         JOIN users u ON u.uuid = a.user_uuid
         WHERE a.event_uuid = ?1
         ORDER BY a.position ASC, u.uuid ASC;",
    )?;
    let rows = stmt
        .query_map([event_uuid], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(uuid, name)| Ok(User::with_id(parse_uuid(&uuid, "users.uuid")?, name)))
        .collect()
}

fn write_attendees(tx: &Transaction<'_>, event: &Event) -> RepoResult<()> {
    for (position, user) in event.attendees.iter().enumerate() {
        tx.execute(
            "INSERT OR IGNORE INTO event_attendees (event_uuid, user_uuid, position)
             VALUES (?1, ?2, ?3);",
            params![event.id.to_string(), user.id.to_string(), position as i64],
        )?;
    }
    Ok(())
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}
