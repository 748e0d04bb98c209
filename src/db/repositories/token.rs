use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::domain::{SessionId, UserId};
use crate::entities::{user_tokens, users};
use crate::models::session::SessionToken;

impl From<user_tokens::Model> for SessionToken {
    fn from(model: user_tokens::Model) -> Self {
        Self {
            id: SessionId::from_uuid(model.id),
            user_id: UserId::from_uuid(model.user_id),
            token: model.token,
            expired_at: model.expired_at,
            created_at: model.created_at,
        }
    }
}

pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Persists a new session and stamps the owner's `last_login` with the
    /// session's creation time. Both writes commit together or not at all.
    pub async fn insert_for_login(&self, session: &SessionToken) -> Result<()> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to begin login transaction")?;

        user_tokens::ActiveModel {
            id: Set(session.id.value()),
            user_id: Set(session.user_id.value()),
            token: Set(session.token.clone()),
            expired_at: Set(session.expired_at),
            created_at: Set(session.created_at),
        }
        .insert(&txn)
        .await
        .context("Failed to insert session token")?;

        let updated = users::Entity::update_many()
            .col_expr(
                users::Column::LastLogin,
                sea_orm::sea_query::Expr::value(session.created_at),
            )
            .filter(users::Column::Id.eq(session.user_id.value()))
            .exec(&txn)
            .await
            .context("Failed to update last login")?;

        if updated.rows_affected == 0 {
            anyhow::bail!("User {} vanished during login", session.user_id);
        }

        txn.commit()
            .await
            .context("Failed to commit login transaction")?;

        Ok(())
    }

    pub async fn get_by_token(&self, token: &str) -> Result<Option<SessionToken>> {
        let row = user_tokens::Entity::find()
            .filter(user_tokens::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query session token")?;

        Ok(row.map(SessionToken::from))
    }

    /// All sessions of a user, newest first, including expired ones.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<SessionToken>> {
        let rows = user_tokens::Entity::find()
            .filter(user_tokens::Column::UserId.eq(user_id.value()))
            .order_by_desc(user_tokens::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list sessions")?;

        Ok(rows.into_iter().map(SessionToken::from).collect())
    }

    pub async fn delete_by_token(&self, token: &str) -> Result<u64> {
        let result = user_tokens::Entity::delete_many()
            .filter(user_tokens::Column::Token.eq(token))
            .exec(&self.conn)
            .await
            .context("Failed to delete session token")?;

        Ok(result.rows_affected)
    }

    pub async fn delete_by_user(&self, user_id: UserId) -> Result<u64> {
        let result = user_tokens::Entity::delete_many()
            .filter(user_tokens::Column::UserId.eq(user_id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to delete user sessions")?;

        Ok(result.rows_affected)
    }

    /// Deletes one session, but only if it belongs to `user_id`.
    pub async fn delete_session(&self, user_id: UserId, session_id: SessionId) -> Result<u64> {
        let result = user_tokens::Entity::delete_many()
            .filter(user_tokens::Column::Id.eq(session_id.value()))
            .filter(user_tokens::Column::UserId.eq(user_id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to delete session")?;

        Ok(result.rows_affected)
    }

    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = user_tokens::Entity::delete_many()
            .filter(user_tokens::Column::ExpiredAt.lte(now))
            .exec(&self.conn)
            .await
            .context("Failed to delete expired sessions")?;

        Ok(result.rows_affected)
    }
}
