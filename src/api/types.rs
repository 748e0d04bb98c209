use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::User;
use crate::domain::{SessionId, UserId, UserStatus};
use crate::models::session::SessionToken;

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "repeatedPassword")]
    pub repeated_password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    /// Always false; second factors are not supported.
    pub enabled_2fa: bool,
    pub expired_at: DateTime<Utc>,
}

impl From<SessionToken> for LoginResponse {
    fn from(session: SessionToken) -> Self {
        Self {
            token: session.token,
            enabled_2fa: false,
            expired_at: session.expired_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub status: UserStatus,
    pub last_login: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            status: user.status,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionDto {
    pub id: SessionId,
    /// Only the last four characters are revealed.
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expired_at: DateTime<Utc>,
    /// True for the session the request was made with.
    pub current: bool,
}

impl SessionDto {
    #[must_use]
    pub fn new(session: &SessionToken, current_token: &str) -> Self {
        Self {
            id: session.id,
            token: session.masked_token(),
            created_at: session.created_at,
            expired_at: session.expired_at,
            current: session.token == current_token,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RevokedResponse {
    pub revoked: u64,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngredientRequest {
    #[serde(default)]
    pub name: String,
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateRecipeRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "photoBase64")]
    pub photo: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub ingredients: Vec<IngredientRequest>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRecipeRequest {
    pub title: Option<String>,
    #[serde(alias = "photoBase64")]
    pub photo: Option<String>,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub ingredients: Option<Vec<IngredientRequest>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub size: Option<u64>,
    pub page: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct HealthLiveResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthReadinessChecks {
    pub database: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthReadyResponse {
    pub ready: bool,
    pub checks: HealthReadinessChecks,
    pub uptime_seconds: u64,
    pub version: &'static str,
}
