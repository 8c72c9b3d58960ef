use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::AnimedexError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub min_request_interval_ms: u64,
    pub result_limit: u32,
    pub sfw: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        AppConfig::default().api
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        AppConfig::default().cache
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        AppConfig::default().logging
    }
}

impl ApiConfig {
    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }
}

impl CacheConfig {
    /// Entry lifetime. Must be a positive number of minutes that `TimeDelta` can hold.
    pub fn ttl(&self) -> Result<chrono::TimeDelta, AnimedexError> {
        if self.ttl_minutes <= 0 {
            return Err(AnimedexError::Config(format!(
                "cache.ttl_minutes must be positive (got {})",
                self.ttl_minutes
            )));
        }
        chrono::TimeDelta::try_minutes(self.ttl_minutes).ok_or_else(|| {
            AnimedexError::Config(format!(
                "cache.ttl_minutes is out of range (got {})",
                self.ttl_minutes
            ))
        })
    }
}

impl AppConfig {
    /// Load config: user file (if exists) over built-in defaults.
    pub fn load() -> Result<Self, AnimedexError> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from an explicit path, falling back to defaults when absent.
    pub fn load_from(path: &Path) -> Result<Self, AnimedexError> {
        if !path.exists() {
            return Self::defaults();
        }
        let user_str =
            std::fs::read_to_string(path).map_err(|e| AnimedexError::Config(e.to_string()))?;
        let config: Self =
            toml::from_str(&user_str).map_err(|e| AnimedexError::Config(e.to_string()))?;
        config.cache.ttl()?;
        Ok(config)
    }

    /// Save current config to the given path.
    pub fn save_to(&self, path: &Path) -> Result<(), AnimedexError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AnimedexError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Path to the key-value store file.
    pub fn store_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.data_dir().join("animedex.db"))
            .unwrap_or_else(|| PathBuf::from("animedex.db"))
    }

    /// Ensure the data directory exists and return the store path.
    pub fn ensure_store_path() -> Result<PathBuf, AnimedexError> {
        let path = Self::store_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

    /// Directory for rolling log files.
    pub fn log_dir() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.data_dir().join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs"))
    }

    fn defaults() -> Result<Self, AnimedexError> {
        toml::from_str(DEFAULT_CONFIG).map_err(|e| AnimedexError::Config(e.to_string()))
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "animedex")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}
