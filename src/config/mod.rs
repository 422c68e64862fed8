use crate::storage::PoolConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout_secs() -> u64 {
    3
}

/// Updater configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdaterConfig {
    /// SQLite URL, e.g. `sqlite://./data/app.db`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// Root directory holding `up/` and `down/`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrations_dir: Option<PathBuf>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            migrations_dir: None,
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

impl UpdaterConfig {
    /// Replace file values with any value given on the command line.
    pub fn with_overrides(mut self, database_url: Option<String>, migrations_dir: Option<PathBuf>) -> Self {
        if database_url.is_some() {
            self.database_url = database_url;
        }
        if migrations_dir.is_some() {
            self.migrations_dir = migrations_dir;
        }
        self
    }

    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing("databaseUrl"))
    }

    pub fn migrations_dir(&self) -> Result<&Path, ConfigError> {
        self.migrations_dir
            .as_deref()
            .ok_or(ConfigError::Missing("migrationsDir"))
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            max_connections: self.max_connections,
            acquire_timeout: Duration::from_secs(self.acquire_timeout_secs),
        }
    }
}

/// Read the configuration file, `None` when it does not exist
pub async fn read_config(config_path: &Path) -> Result<Option<UpdaterConfig>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(config_path).await?;
    let config: UpdaterConfig = serde_json::from_str(&content)?;
    Ok(Some(config))
}
