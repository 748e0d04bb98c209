//! `SeaORM` implementation of the `TokenService` trait.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use crate::db::Store;
use crate::domain::{SessionId, UserId};
use crate::models::session::SessionToken;
use crate::services::token_service::{TokenError, TokenService};

pub struct SeaOrmTokenService {
    store: Store,
    ttl: chrono::Duration,
}

impl SeaOrmTokenService {
    #[must_use]
    pub const fn new(store: Store, ttl: chrono::Duration) -> Self {
        Self { store, ttl }
    }
}

#[async_trait]
impl TokenService for SeaOrmTokenService {
    async fn issue(&self, user_id: UserId) -> Result<SessionToken, TokenError> {
        let session = SessionToken::new(user_id, Utc::now(), self.ttl)?;
        self.store.add_login_session(&session).await?;

        debug!(user_id = %user_id, session_id = %session.id, "Session issued");
        Ok(session)
    }

    async fn resolve(&self, token: &str) -> Result<SessionToken, TokenError> {
        let session = self
            .store
            .get_session(token)
            .await?
            .ok_or(TokenError::NoToken)?;

        if session.is_expired_at(Utc::now()) {
            return Err(TokenError::TokenExpired);
        }

        Ok(session)
    }

    async fn revoke(&self, token: &str) -> Result<(), TokenError> {
        match self.store.delete_session_by_token(token).await? {
            0 => Err(TokenError::NoToken),
            _ => Ok(()),
        }
    }

    async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, TokenError> {
        let deleted = self.store.delete_sessions_for_user(user_id).await?;
        info!(user_id = %user_id, count = deleted, "Revoked all sessions");
        Ok(deleted)
    }

    async fn list_active_sessions(&self, user_id: UserId) -> Result<Vec<SessionToken>, TokenError> {
        let now = Utc::now();
        let sessions = self.store.list_sessions(user_id).await?;

        Ok(sessions
            .into_iter()
            .filter(|s| !s.is_expired_at(now))
            .collect())
    }

    async fn revoke_session(&self, user_id: UserId, session_id: SessionId) -> Result<(), TokenError> {
        match self.store.delete_session(user_id, session_id).await? {
            0 => Err(TokenError::NoToken),
            _ => Ok(()),
        }
    }

    async fn sweep_expired(&self) -> Result<u64, TokenError> {
        Ok(self.store.delete_expired_sessions(Utc::now()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewUser;
    use crate::domain::UserStatus;

    async fn setup() -> (Store, SeaOrmTokenService, UserId) {
        let path = std::env::temp_dir().join(format!("kitchen_nerd_tokens_{}.db", uuid::Uuid::new_v4()));
        let store = Store::new(&format!("sqlite:{}", path.display())).await.unwrap();
        let user = store
            .create_user(NewUser {
                id: UserId::generate(),
                email: "ann@example.com".to_string(),
                name: "Ann".to_string(),
                status: UserStatus::User,
                password_hash: "hash".to_string(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let service = SeaOrmTokenService::new(store.clone(), chrono::Duration::days(5));
        (store, service, user.id)
    }

    #[tokio::test]
    async fn resolve_is_idempotent() {
        let (_, service, user_id) = setup().await;
        let session = service.issue(user_id).await.unwrap();

        let first = service.resolve(&session.token).await.unwrap();
        let second = service.resolve(&session.token).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.user_id, user_id);
    }

    #[tokio::test]
    async fn unknown_token_is_no_token() {
        let (_, service, _) = setup().await;
        assert!(matches!(service.resolve("nope").await, Err(TokenError::NoToken)));
        assert!(matches!(service.revoke("nope").await, Err(TokenError::NoToken)));
    }

    #[tokio::test]
    async fn expired_token_is_rejected_but_kept() {
        let (store, service, user_id) = setup().await;
        let past = Utc::now() - chrono::Duration::days(6);
        let stale = SessionToken::new(user_id, past, chrono::Duration::days(5)).unwrap();
        store.add_login_session(&stale).await.unwrap();

        assert!(matches!(
            service.resolve(&stale.token).await,
            Err(TokenError::TokenExpired)
        ));
        assert!(store.get_session(&stale.token).await.unwrap().is_some());
        assert!(service.list_active_sessions(user_id).await.unwrap().is_empty());

        assert_eq!(service.sweep_expired().await.unwrap(), 1);
        assert!(matches!(service.resolve(&stale.token).await, Err(TokenError::NoToken)));
    }

    #[tokio::test]
    async fn unrepresentable_expiry_fails_without_storing() {
        let (store, _, user_id) = setup().await;
        let service = SeaOrmTokenService::new(store.clone(), chrono::TimeDelta::MAX);

        assert!(matches!(service.issue(user_id).await, Err(TokenError::Persistence(_))));
        assert!(store.list_sessions(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn revoke_variants() {
        let (_, service, user_id) = setup().await;
        let a = service.issue(user_id).await.unwrap();
        let b = service.issue(user_id).await.unwrap();
        let c = service.issue(user_id).await.unwrap();

        service.revoke(&a.token).await.unwrap();
        assert!(matches!(service.resolve(&a.token).await, Err(TokenError::NoToken)));

        assert!(matches!(
            service.revoke_session(UserId::generate(), b.id).await,
            Err(TokenError::NoToken)
        ));
        service.revoke_session(user_id, b.id).await.unwrap();

        let active = service.list_active_sessions(user_id).await.unwrap();
        assert_eq!(active, vec![c]);

        assert_eq!(service.revoke_all_for_user(user_id).await.unwrap(), 1);
        assert_eq!(service.revoke_all_for_user(user_id).await.unwrap(), 0);
    }
}
