//! App core configuration
//!
//! Loaded from TOML, then overridden by environment variables:
//!
//! ```toml
//! [storage]
//! dir = ".rigmarket/storage"
//!
//! [network]
//! request_timeout_ms = 15000
//!
//! [logging]
//! filter = "info"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// Overrides `storage.dir`
pub const ENV_STORAGE_DIR: &str = "RIGMARKET_STORAGE_DIR";
/// Overrides `network.request_timeout_ms`
pub const ENV_REQUEST_TIMEOUT_MS: &str = "RIGMARKET_REQUEST_TIMEOUT_MS";
/// Overrides `logging.filter`
pub const ENV_LOG: &str = "RIGMARKET_LOG";

/// Accepted request timeouts in milliseconds
pub const REQUEST_TIMEOUT_RANGE_MS: std::ops::RangeInclusive<u64> = 100..=120_000;

/// Local persistence settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the key-value files
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".rigmarket/storage"),
        }
    }
}

/// Backend call settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Upper bound for a single backend call
    pub request_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 15_000,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing-subscriber` env-filter directive
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Local persistence
    pub storage: StorageConfig,
    /// Backend calls
    pub network: NetworkConfig,
    /// Logging
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load_from_file(path: &Path) -> AppResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(err) => Err(AppError::config(format!(
                "failed to read {}: {err}",
                path.display()
            ))),
        }
    }

    /// Parse TOML text; absent sections take their defaults.
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::config(format!("invalid config: {e}")))
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> AppResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| AppError::config(format!("failed to serialize config: {e}")))
    }

    /// Apply `RIGMARKET_*` environment overrides.
    pub fn merge_with_env(&mut self) -> AppResult<()> {
        self.merge_with_vars(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn merge_with_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) -> AppResult<()> {
        if let Some(dir) = lookup(ENV_STORAGE_DIR) {
            self.storage.dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_MS) {
            self.network.request_timeout_ms = raw.trim().parse().map_err(|_| {
                AppError::config(format!("{ENV_REQUEST_TIMEOUT_MS} is not a number: {raw}"))
            })?;
        }
        if let Some(filter) = lookup(ENV_LOG) {
            self.logging.filter = filter;
        }
        Ok(())
    }

    /// Check value ranges.
    pub fn validate(&self) -> AppResult<()> {
        if self.storage.dir.as_os_str().is_empty() {
            return Err(AppError::config("storage.dir must not be empty"));
        }
        if !REQUEST_TIMEOUT_RANGE_MS.contains(&self.network.request_timeout_ms) {
            return Err(AppError::config(format!(
                "network.request_timeout_ms must be within {}..={} (got {})",
                REQUEST_TIMEOUT_RANGE_MS.start(),
                REQUEST_TIMEOUT_RANGE_MS.end(),
                self.network.request_timeout_ms
            )));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(AppError::config("logging.filter must not be empty"));
        }
        Ok(())
    }

    /// Request timeout as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.network.request_timeout_ms)
    }
}
