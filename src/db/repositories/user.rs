use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::warn;

use crate::domain::{UserId, UserStatus};
use crate::entities::users;

/// User data returned from repository (without sensitive password hash)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub status: UserStatus,
    pub last_login: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        let status = model.status.parse().unwrap_or_else(|e| {
            warn!(user_id = %model.id, error = %e, "Stored user status unreadable, treating as user");
            UserStatus::User
        });

        Self {
            id: UserId::from_uuid(model.id),
            email: model.email,
            name: model.name,
            status,
            last_login: model.last_login,
            created_at: model.created_at,
        }
    }
}

/// Everything needed to insert a user row. The email must already be normalized
/// and the password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub status: UserStatus,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts a user. A duplicate email surfaces as a `DbErr` unique violation
    /// inside the returned error.
    pub async fn create(&self, user: NewUser) -> Result<User> {
        let model = users::ActiveModel {
            id: Set(user.id.value()),
            email: Set(user.email),
            name: Set(user.name),
            status: Set(user.status.as_str().to_string()),
            password_hash: Set(user.password_hash),
            last_login: Set(user.created_at),
            created_at: Set(user.created_at),
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert user")?;

        Ok(User::from(model))
    }

    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    /// Get user by email together with the stored password hash (for login)
    pub async fn get_by_email_with_password(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(|u| {
            let password_hash = u.password_hash.clone();
            (User::from(u), password_hash)
        }))
    }

    /// Returns `false` when no user has this email.
    pub async fn set_status(&self, email: &str, status: UserStatus) -> Result<bool> {
        let Some(user) = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user for status update")?
        else {
            return Ok(false);
        };

        let mut active: users::ActiveModel = user.into();
        active.status = Set(status.as_str().to_string());
        active
            .update(&self.conn)
            .await
            .context("Failed to update user status")?;

        Ok(true)
    }
}
