//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::{NewUser, Store, User, is_unique_violation};
use crate::domain::{UserId, UserStatus, normalize_email};
use crate::models::session::SessionToken;
use crate::services::password::{self, PasswordHasher};
use crate::services::token_service::TokenService;
use crate::services::user_service::{Profile, UserError, UserService};

pub struct SeaOrmUserService {
    store: Store,
    hasher: PasswordHasher,
    tokens: Arc<dyn TokenService>,
}

impl SeaOrmUserService {
    #[must_use]
    pub fn new(store: Store, hasher: PasswordHasher, tokens: Arc<dyn TokenService>) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, UserError> {
        if !password::is_valid(password) {
            return Err(UserError::InvalidPassword);
        }

        let email = normalize_email(email);
        if self.store.get_user_by_email(&email).await?.is_some() {
            return Err(UserError::EmailAlreadyInUse);
        }

        let password_hash = self
            .hasher
            .hash(password)
            .await
            .map_err(|e| UserError::Internal(format!("{e:#}")))?;

        let user = self
            .store
            .create_user(NewUser {
                id: UserId::generate(),
                email,
                name: name.trim().to_string(),
                status: UserStatus::User,
                password_hash,
                created_at: Utc::now(),
            })
            .await
            .map_err(|e| {
                // A concurrent registration can slip past the explicit check
                if is_unique_violation(&e) {
                    UserError::EmailAlreadyInUse
                } else {
                    UserError::from(e)
                }
            })?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    async fn login(&self, email: &str, password: &str) -> Result<SessionToken, UserError> {
        let email = normalize_email(email);

        let Some((user, password_hash)) = self.store.get_user_with_password(&email).await? else {
            self.hasher
                .verify_dummy(password)
                .await
                .map_err(|e| UserError::Internal(format!("{e:#}")))?;
            return Err(UserError::WrongCredentials);
        };

        let verified = self
            .hasher
            .verify(&password_hash, password)
            .await
            .map_err(|e| UserError::Internal(format!("{e:#}")))?;

        if !verified {
            warn!(user_id = %user.id, "Login rejected: wrong password");
            return Err(UserError::WrongCredentials);
        }

        let session = self.tokens.issue(user.id).await?;

        info!(user_id = %user.id, "User logged in");
        Ok(session)
    }

    async fn get(&self, id: UserId) -> Result<User, UserError> {
        self.store.get_user(id).await?.ok_or(UserError::NotFound)
    }

    async fn get_profile(&self, id: UserId) -> Result<Profile, UserError> {
        self.get(id).await.map(Profile::from)
    }

    async fn promote(&self, email: &str) -> Result<(), UserError> {
        let email = normalize_email(email);
        if !self.store.set_user_status(&email, UserStatus::Admin).await? {
            return Err(UserError::NotFound);
        }

        info!("Promoted {} to admin", email);
        Ok(())
    }
}
