//! Periodic deletion of expired session tokens.

use anyhow::Result;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::SecurityConfig;
use crate::services::token_service::TokenService;

pub struct SessionSweeper {
    tokens: Arc<dyn TokenService>,
    config: SecurityConfig,
}

impl SessionSweeper {
    #[must_use]
    pub fn new(tokens: Arc<dyn TokenService>, config: SecurityConfig) -> Self {
        Self { tokens, config }
    }

    /// Registers the sweep job and starts the scheduler. Returns `None` when
    /// sweeping is disabled; the caller owns the scheduler and shuts it down.
    pub async fn start(&self) -> Result<Option<JobScheduler>> {
        if !self.config.sweep_enabled {
            info!("Session sweep is disabled in config");
            return Ok(None);
        }

        let sched = JobScheduler::new().await?;

        let tokens = Arc::clone(&self.tokens);
        let job = Job::new_async(self.config.sweep_cron.as_str(), move |_uuid, _lock| {
            let tokens = Arc::clone(&tokens);
            Box::pin(async move {
                let start = std::time::Instant::now();
                match tokens.sweep_expired().await {
                    Ok(count) => info!(
                        event = "job_finished",
                        job_name = "sweep_sessions",
                        deleted = count,
                        duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                        "Expired sessions swept"
                    ),
                    Err(e) => error!(
                        event = "job_failed",
                        job_name = "sweep_sessions",
                        error = %e,
                        "Session sweep failed"
                    ),
                }
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!("Session sweep scheduled: {}", self.config.sweep_cron);
        Ok(Some(sched))
    }

    /// Runs one sweep immediately.
    pub async fn run_once(&self) -> Result<u64> {
        let count = self.tokens.sweep_expired().await?;
        info!(deleted = count, "Expired sessions swept");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, Store};
    use crate::domain::{UserId, UserStatus};
    use crate::models::session::SessionToken;
    use crate::services::SeaOrmTokenService;
    use chrono::Utc;

    async fn setup() -> (Store, Arc<dyn TokenService>, UserId) {
        let path = std::env::temp_dir().join(format!("kitchen_nerd_sweep_{}.db", uuid::Uuid::new_v4()));
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

        let tokens: Arc<dyn TokenService> =
            Arc::new(SeaOrmTokenService::new(store.clone(), chrono::Duration::days(5)));
        (store, tokens, user.id)
    }

    #[tokio::test]
    async fn run_once_deletes_only_expired_sessions() {
        let (store, tokens, user_id) = setup().await;
        let now = Utc::now();

        let stale =
            SessionToken::new(user_id, now - chrono::Duration::days(6), chrono::Duration::days(5)).unwrap();
        store.add_login_session(&stale).await.unwrap();
        let fresh = tokens.issue(user_id).await.unwrap();

        let sweeper = SessionSweeper::new(tokens, SecurityConfig::default());
        assert_eq!(sweeper.run_once().await.unwrap(), 1);
        assert_eq!(sweeper.run_once().await.unwrap(), 0);
        assert_eq!(store.list_sessions(user_id).await.unwrap(), vec![fresh]);
    }

    #[tokio::test]
    async fn disabled_sweep_starts_no_scheduler() {
        let (_, tokens, _) = setup().await;
        let config = SecurityConfig {
            sweep_enabled: false,
            ..SecurityConfig::default()
        };

        let scheduler = SessionSweeper::new(tokens, config).start().await.unwrap();
        assert!(scheduler.is_none());
    }

    #[tokio::test]
    async fn enabled_sweep_starts_and_shuts_down() {
        let (_, tokens, _) = setup().await;

        let mut scheduler = SessionSweeper::new(tokens, SecurityConfig::default())
            .start()
            .await
            .unwrap()
            .expect("sweep is enabled by default");
        scheduler.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn invalid_cron_fails_to_start() {
        let (_, tokens, _) = setup().await;
        let config = SecurityConfig {
            sweep_cron: "a b c d e f".to_string(),
            ..SecurityConfig::default()
        };

        assert!(SessionSweeper::new(tokens, config).start().await.is_err());
    }
}
