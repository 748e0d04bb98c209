use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;

use crate::domain::{SessionId, UserId};

/// Length of the opaque token string handed to clients.
pub const TOKEN_LENGTH: usize = 36;

/// A persisted login session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub id: SessionId,
    pub user_id: UserId,
    pub token: String,
    pub expired_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SessionToken {
    /// Builds a fresh session for `user_id` valid for `ttl` from `now`.
    /// Fails when the expiry is not representable.
    pub fn new(user_id: UserId, now: DateTime<Utc>, ttl: chrono::Duration) -> Result<Self> {
        let expired_at = now
            .checked_add_signed(ttl)
            .with_context(|| format!("Session expiry overflows: {now} + {ttl}"))?;

        Ok(Self {
            id: SessionId::generate(),
            user_id,
            token: generate_token(),
            expired_at,
            created_at: now,
        })
    }

    /// A token stops being valid at the instant `expired_at` is reached.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expired_at
    }

    /// Token string with everything but the last four characters hidden.
    #[must_use]
    pub fn masked_token(&self) -> String {
        let visible = self.token.len().saturating_sub(4);
        format!("{}{}", "*".repeat(visible), &self.token[visible..])
    }
}

/// Generates a random base62 token from the thread-local CSPRNG.
#[must_use]
pub fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}
