use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Database URL, e.g. `sqlite:data/kitchen_nerd.db`.
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (0 = number of CPU cores)
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/kitchen_nerd.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the HTTP server binds to.
    pub address: String,

    pub cors_allowed_origins: Vec<String>,

    /// Reject requests to protected routes that carry no `Authorization` header.
    /// When false, such requests pass through as anonymous and only handlers
    /// that need a caller identity respond with 401.
    pub require_auth: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8088".to_string(),
            cors_allowed_origins: vec![
                "http://localhost:8088".to_string(),
                "http://127.0.0.1:8088".to_string(),
            ],
            require_auth: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,

    /// Lifetime of a session token, counted from login.
    pub session_ttl_hours: u64,

    /// Periodically delete expired session tokens. Expiry is always enforced
    /// when a token is resolved; the sweep only reclaims rows.
    pub sweep_enabled: bool,

    /// Six-field cron expression (with seconds) for the sweep job.
    pub sweep_cron: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            session_ttl_hours: 5 * 24,
            sweep_enabled: true,
            sweep_cron: "0 0 * * * *".to_string(),
        }
    }
}

/// Ten years.
pub const MAX_SESSION_TTL_HOURS: u64 = 24 * 365 * 10;

impl SecurityConfig {
    pub fn session_ttl(&self) -> Result<chrono::TimeDelta> {
        i64::try_from(self.session_ttl_hours)
            .ok()
            .and_then(chrono::TimeDelta::try_hours)
            .with_context(|| {
                format!(
                    "security.session_ttl_hours out of range: {}",
                    self.session_ttl_hours
                )
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

impl Config {
    /// Loads the first config file found, then applies environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// `DATABASE_URL` and `SERVER_ADDRESS` take precedence over the file.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            self.general.database_path = url;
        }
        if let Some(address) = lookup("SERVER_ADDRESS").filter(|v| !v.is_empty()) {
            self.server.address = address;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("kitchen-nerd").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".kitchen-nerd").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            Self::default().save_to_path(&path)?;
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.address.trim().is_empty() {
            anyhow::bail!("server.address cannot be empty");
        }

        if self.security.session_ttl_hours == 0 {
            anyhow::bail!("security.session_ttl_hours must be > 0");
        }

        if self.security.session_ttl_hours > MAX_SESSION_TTL_HOURS {
            anyhow::bail!(
                "security.session_ttl_hours must be <= {MAX_SESSION_TTL_HOURS}, got {}",
                self.security.session_ttl_hours
            );
        }

        if self.security.sweep_enabled {
            let cron = self.security.sweep_cron.as_str();
            if cron.split_whitespace().count() != 6 {
                anyhow::bail!(
                    "security.sweep_cron must have six fields (sec min hour day month weekday), got '{cron}'"
                );
            }

            // Same parser the scheduler uses at startup
            tokio_cron_scheduler::Job::new(cron, |_uuid, _lock| {})
                .map_err(|e| anyhow::anyhow!("security.sweep_cron is invalid '{cron}': {e}"))?;
        }

        if self.general.min_db_connections > self.general.max_db_connections {
            anyhow::bail!("general.min_db_connections cannot exceed max_db_connections");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.security.session_ttl_hours, 120);
        assert_eq!(config.security.session_ttl().unwrap(), chrono::Duration::days(5));
        assert!(config.server.require_auth);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[security]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [server]
            require_auth = false
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert!(!config.server.require_auth);
        assert_eq!(config.server.address, "127.0.0.1:8088");
        assert_eq!(config.security.session_ttl_hours, 120);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides_from(|key| match key {
            "DATABASE_URL" => Some("sqlite::memory:".to_string()),
            "SERVER_ADDRESS" => Some(String::new()),
            _ => None,
        });

        assert_eq!(config.general.database_path, "sqlite::memory:");
        assert_eq!(config.server.address, "127.0.0.1:8088");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.security.session_ttl_hours = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.security.sweep_cron = "*/5 * * * *".to_string();
        assert!(config.validate().is_err());

        config.security.sweep_enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_ttl() {
        let mut config = Config::default();
        config.security.session_ttl_hours = 10_000_000_000;
        assert!(config.validate().is_err());
        assert!(config.security.session_ttl().is_err());

        config.security.session_ttl_hours = MAX_SESSION_TTL_HOURS;
        assert!(config.validate().is_ok());
        assert!(config.security.session_ttl().is_ok());
    }

    #[test]
    fn test_validate_parses_sweep_cron() {
        let mut config = Config::default();
        config.security.sweep_cron = "a b c d e f".to_string();
        assert!(config.validate().is_err());

        config.security.sweep_cron = "0 */15 * * * *".to_string();
        assert!(config.validate().is_ok());
    }
}
