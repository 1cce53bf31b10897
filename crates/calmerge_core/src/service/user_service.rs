//! User use-case service.

use crate::model::user::{User, UserId, UserWithEvents};
use crate::repo::event_repo::RepoError;
use crate::repo::user_repo::UserRepository;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for user use-cases.
#[derive(Debug)]
pub enum UserServiceError {
    /// Name is empty after trimming.
    InvalidName,
    UserNotFound(UserId),
    Repo(RepoError),
}

impl Display for UserServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "user name must not be blank"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for UserServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for UserServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::UserNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub struct UserService<U: UserRepository> {
    repo: U,
}

impl<U: UserRepository> UserService<U> {
    pub fn new(repo: U) -> Self {
        Self { repo }
    }

    /// Creates a user; the name is stored trimmed.
    pub fn create_user(&self, name: &str) -> Result<User, UserServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(UserServiceError::InvalidName);
        }
        let user = User::new(name);
        self.repo.create_user(&user)?;
        Ok(user)
    }

    pub fn list_users(&self) -> Result<Vec<UserWithEvents>, UserServiceError> {
        Ok(self.repo.list_users_with_events()?)
    }

    pub fn get_user(&self, id: UserId) -> Result<UserWithEvents, UserServiceError> {
        self.repo
            .get_user_with_events(id)?
            .ok_or(UserServiceError::UserNotFound(id))
    }

    /// Deletes a user; events they attended are kept.
    pub fn remove_user(&self, id: UserId) -> Result<(), UserServiceError> {
        Ok(self.repo.delete_user(id)?)
    }
}
