use crate::domain::constants::SYNC_BATCH_SIZE;
use crate::shared::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub auto_sync: bool,
    pub interval_secs: u64,
    pub batch_size: usize,
    pub retry_base_secs: u64,
    pub retry_max_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: 5,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_sync: true,
            interval_secs: 900, // 15 minutes
            batch_size: SYNC_BATCH_SIZE,
            retry_base_secs: 30,
            retry_max_secs: 3600,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("FEED_SYNC_DATABASE_URL") {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                cfg.database.url = trimmed.to_string();
            }
        }
        if let Some(value) = env_parsed::<u32>("FEED_SYNC_MAX_CONNECTIONS") {
            cfg.database.max_connections = value;
        }

        if let Ok(v) = std::env::var("FEED_SYNC_AUTO_SYNC") {
            cfg.sync.auto_sync = parse_bool(&v, cfg.sync.auto_sync);
        }
        if let Some(value) = env_parsed::<u64>("FEED_SYNC_SYNC_INTERVAL_SECS") {
            cfg.sync.interval_secs = value.max(1);
        }
        if let Some(value) = env_parsed::<usize>("FEED_SYNC_BATCH_SIZE") {
            cfg.sync.batch_size = value;
        }
        if let Some(value) = env_parsed::<u64>("FEED_SYNC_RETRY_BASE_SECS") {
            cfg.sync.retry_base_secs = value;
        }
        if let Some(value) = env_parsed::<u64>("FEED_SYNC_RETRY_MAX_SECS") {
            cfg.sync.retry_max_secs = value;
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.database.max_connections == 0 {
            return Err(AppError::Configuration(
                "Database max_connections must be greater than 0".to_string(),
            ));
        }
        if self.sync.batch_size == 0 {
            return Err(AppError::Configuration(
                "Sync batch_size must be greater than 0".to_string(),
            ));
        }
        if self.sync.interval_secs == 0 {
            return Err(AppError::Configuration(
                "Sync interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.sync.retry_base_secs > self.sync.retry_max_secs {
            return Err(AppError::Configuration(
                "Sync retry_base_secs must not exceed retry_max_secs".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_database_url() -> String {
    let dir = dirs::data_local_dir()
        .map(|dir| dir.join("feed-sync"))
        .unwrap_or_else(|| PathBuf::from("./data"));
    format!("sqlite:{}?mode=rwc", dir.join("feed.db").display())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}
