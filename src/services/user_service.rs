//! Domain service for registration, login and profiles.

use serde::Serialize;
use thiserror::Error;

use crate::db::User;
use crate::domain::{UserId, UserStatus};
use crate::models::session::SessionToken;
use crate::services::password::POLICY_MESSAGE;
use crate::services::token_service::TokenError;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("password is invalid: {}", POLICY_MESSAGE)]
    InvalidPassword,

    #[error("user with such email address already exists")]
    EmailAlreadyInUse,

    #[error("wrong credentials")]
    WrongCredentials,

    #[error("user not found")]
    NotFound,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Database error: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Persistence(format!("{err:#}"))
    }
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Profile {
    pub id: UserId,
    pub name: String,
    pub status: UserStatus,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            status: user.status,
        }
    }
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Creates a user with status `user`. Does not log the user in.
    ///
    /// # Errors
    ///
    /// [`UserError::InvalidPassword`] if the password fails the policy,
    /// [`UserError::EmailAlreadyInUse`] if the normalized email is taken.
    async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, UserError>;

    /// Verifies credentials and issues a new session.
    ///
    /// # Errors
    ///
    /// [`UserError::WrongCredentials`] for an unknown email or a wrong password.
    async fn login(&self, email: &str, password: &str) -> Result<SessionToken, UserError>;

    async fn get(&self, id: UserId) -> Result<User, UserError>;

    async fn get_profile(&self, id: UserId) -> Result<Profile, UserError>;

    /// Grants admin status to the user with this email.
    async fn promote(&self, email: &str) -> Result<(), UserError>;
}
