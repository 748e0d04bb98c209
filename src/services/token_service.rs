//! Domain service for session tokens.
//!
//! Tokens are opaque bearer strings with a fixed lifetime. Validity is decided
//! at resolve time; expired rows linger until revoked or swept.

use thiserror::Error;

use crate::domain::{SessionId, UserId};
use crate::models::session::SessionToken;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token does not exist")]
    NoToken,

    #[error("token expired")]
    TokenExpired,

    #[error("Database error: {0}")]
    Persistence(String),
}

impl From<anyhow::Error> for TokenError {
    fn from(err: anyhow::Error) -> Self {
        Self::Persistence(format!("{err:#}"))
    }
}

#[async_trait::async_trait]
pub trait TokenService: Send + Sync {
    /// Creates and stores a new session for `user_id`, stamping the user's
    /// last login in the same transaction.
    async fn issue(&self, user_id: UserId) -> Result<SessionToken, TokenError>;

    /// Looks up a token by exact match.
    ///
    /// # Errors
    ///
    /// [`TokenError::NoToken`] if absent, [`TokenError::TokenExpired`] once
    /// `now >= expired_at`. The row is left in place either way.
    async fn resolve(&self, token: &str) -> Result<SessionToken, TokenError>;

    async fn revoke(&self, token: &str) -> Result<(), TokenError>;

    /// Deletes every session of the user and returns how many there were.
    async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, TokenError>;

    /// Non-expired sessions of the user, newest first.
    async fn list_active_sessions(&self, user_id: UserId) -> Result<Vec<SessionToken>, TokenError>;

    /// Deletes one session by id, scoped to its owner.
    async fn revoke_session(&self, user_id: UserId, session_id: SessionId) -> Result<(), TokenError>;

    /// Physically removes all expired sessions.
    async fn sweep_expired(&self) -> Result<u64, TokenError>;
}
