//! User repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Deleting a user removes their attendee links but never their events.
//! - Listings are ordered by creation (insertion order breaks ties).

use crate::model::event::EventId;
use crate::model::user::{User, UserId, UserWithEvents};
use crate::repo::event_repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Storage contract for users.
pub trait UserRepository {
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn get_user_with_events(&self, id: UserId) -> RepoResult<Option<UserWithEvents>>;
    fn list_users_with_events(&self) -> RepoResult<Vec<UserWithEvents>>;
    fn delete_user(&self, id: UserId) -> RepoResult<()>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn attended_event_ids(&self, user_uuid: &str) -> RepoResult<Vec<EventId>> {
        let mut stmt = self.conn.prepare(
            "SELECT e.uuid
             FROM event_attendees a
             JOIN events e ON e.uuid = a.event_uuid
             WHERE a.user_uuid = ?1
             ORDER BY e.start_ms ASC, e.rowid ASC;",
        )?;
        let rows = stmt
            .query_map([user_uuid], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.iter()
            .map(|uuid| parse_uuid(uuid, "events.uuid"))
            .collect()
    }

    fn with_events(&self, user: User) -> RepoResult<UserWithEvents> {
        let event_ids = self.attended_event_ids(&user.id.to_string())?;
        Ok(UserWithEvents { user, event_ids })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        if user.id.is_nil() {
            return Err(RepoError::InvalidData(
                "nil uuid cannot identify a user".to_string(),
            ));
        }

        self.conn.execute(
            "INSERT INTO users (uuid, name) VALUES (?1, ?2);",
            params![user.id.to_string(), user.name.as_str()],
        )?;
        Ok(user.id)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let name: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM users WHERE uuid = ?1;",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        Ok(name.map(|name| User::with_id(id, name)))
    }

    fn get_user_with_events(&self, id: UserId) -> RepoResult<Option<UserWithEvents>> {
        self.get_user(id)?
            .map(|user| self.with_events(user))
            .transpose()
    }

    fn list_users_with_events(&self) -> RepoResult<Vec<UserWithEvents>> {
        let mut stmt = self
            .conn
            .prepare("SELECT uuid, name FROM users ORDER BY created_at ASC, rowid ASC;")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(uuid, name)| {
                let user = User::with_id(parse_uuid(&uuid, "users.uuid")?, name);
                self.with_events(user)
            })
            .collect()
    }

    fn delete_user(&self, id: UserId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}
