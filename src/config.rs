//! Configuration management for the lending desk

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use validator::Validate;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// An in-memory store lives inside a single connection
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    /// When set, logs go to a daily-rolling file in this directory instead of stderr
    pub directory: Option<String>,
}

/// How a late return is charged against reputation
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyMode {
    /// Subtract the member's whole accumulated penalty on every late return
    #[default]
    Cumulative,
    /// Subtract only the penalty accrued by this return
    Incremental,
}

#[derive(Debug, Deserialize, Clone, Validate)]
#[serde(default)]
pub struct LendingConfig {
    #[validate(range(min = 0, message = "penalty_per_day cannot be negative"))]
    pub penalty_per_day: i64,
    #[validate(range(min = 0, message = "on_time_bonus cannot be negative"))]
    pub on_time_bonus: i64,
    pub penalty_mode: PenaltyMode,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub lending: LendingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            // Layer on the environment-specific file
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // LENDING__LENDING__PENALTY_MODE=incremental
            .add_source(
                Environment::with_prefix("LENDING")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .build()?;

        Self::from_config(config)
    }

    /// Deserialize a built configuration and reject out-of-range lending terms
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let app: AppConfig = config.try_deserialize()?;
        app.lending
            .validate()
            .map_err(|e| ConfigError::Message(format!("invalid lending section: {}", e)))?;
        Ok(app)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:library.db?mode=rwc".to_string(),
            max_connections: 1,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            directory: None,
        }
    }
}

impl Default for LendingConfig {
    fn default() -> Self {
        Self {
            penalty_per_day: 5,
            on_time_bonus: 5,
            penalty_mode: PenaltyMode::Cumulative,
        }
    }
}
