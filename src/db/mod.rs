use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::domain::{RecipeId, SessionId, UserId, UserStatus};
use crate::models::recipe::{PageRequest, Recipe, RecipeDraft};
use crate::models::session::SessionToken;

pub mod migrator;
pub mod repositories;

pub use repositories::user::{NewUser, User};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
        if !path_str.starts_with(":memory:") {
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)
                    .with_context(|| format!("Failed to create database file {path_str}"))?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt)
            .await
            .context("Failed to connect to database")?;

        migrator::Migrator::up(&conn, None)
            .await
            .context("Failed to apply migrations")?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn token_repo(&self) -> repositories::token::TokenRepository {
        repositories::token::TokenRepository::new(self.conn.clone())
    }

    fn recipe_repo(&self) -> repositories::recipe::RecipeRepository {
        repositories::recipe::RecipeRepository::new(self.conn.clone())
    }

    // Users

    pub async fn create_user(&self, user: NewUser) -> Result<User> {
        self.user_repo().create(user).await
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_with_password(&self, email: &str) -> Result<Option<(User, String)>> {
        self.user_repo().get_by_email_with_password(email).await
    }

    pub async fn set_user_status(&self, email: &str, status: UserStatus) -> Result<bool> {
        self.user_repo().set_status(email, status).await
    }

    // Session tokens

    pub async fn add_login_session(&self, session: &SessionToken) -> Result<()> {
        self.token_repo().insert_for_login(session).await
    }

    pub async fn get_session(&self, token: &str) -> Result<Option<SessionToken>> {
        self.token_repo().get_by_token(token).await
    }

    pub async fn list_sessions(&self, user_id: UserId) -> Result<Vec<SessionToken>> {
        self.token_repo().list_for_user(user_id).await
    }

    pub async fn delete_session_by_token(&self, token: &str) -> Result<u64> {
        self.token_repo().delete_by_token(token).await
    }

    pub async fn delete_sessions_for_user(&self, user_id: UserId) -> Result<u64> {
        self.token_repo().delete_by_user(user_id).await
    }

    pub async fn delete_session(&self, user_id: UserId, session_id: SessionId) -> Result<u64> {
        self.token_repo().delete_session(user_id, session_id).await
    }

    pub async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        self.token_repo().delete_expired(now).await
    }

    // Recipes

    pub async fn create_recipe(&self, draft: RecipeDraft) -> Result<Recipe> {
        self.recipe_repo().create(draft).await
    }

    pub async fn get_recipe(&self, id: RecipeId) -> Result<Option<Recipe>> {
        self.recipe_repo().get(id).await
    }

    pub async fn list_recipes(&self, page: PageRequest) -> Result<(Vec<Recipe>, u64)> {
        self.recipe_repo().list(page).await
    }

    pub async fn update_recipe(&self, id: RecipeId, draft: RecipeDraft) -> Result<Option<Recipe>> {
        self.recipe_repo().update(id, draft).await
    }

    pub async fn delete_recipe(&self, id: RecipeId) -> Result<bool> {
        self.recipe_repo().delete(id).await
    }
}

/// True when `err` (anywhere in its context chain) is a unique-index violation.
#[must_use]
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<DbErr>())
        .any(|db_err| matches!(db_err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))))
}
