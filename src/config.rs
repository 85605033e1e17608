//! Runtime Configuration
//!
//! Loaded from `runtime.toml` in the platform config directory. Every key is
//! optional; missing keys fall back to the defaults in [`crate::constants`].
//!
//! ```toml
//! [logging]
//! archive_capacity = 5000
//! default_prefix = "WEB"
//! debug = false
//! console = true
//! log_file = "runtime.log"
//!
//! [navigation]
//! history_capacity = 2000
//!
//! [services]
//! lifecycle_timeout_ms = 30000
//!
//! [rest]
//! base_url = "https://api.example.com/"
//! request_timeout_ms = 30000
//! ```

use crate::constants::{
    CONFIG_FILE_NAME, DEFAULT_LOG_PREFIX, LIFECYCLE_TIMEOUT_MS, LOG_ARCHIVE_CAPACITY,
    NAVIGATION_HISTORY_CAPACITY, REQUEST_TIMEOUT_MS,
};
use crate::error::Result;
use crate::helpers::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Main runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub logging: LoggingConfig,
    pub navigation: NavigationConfig,
    pub services: ServicesConfig,
    pub rest: RestConfig,
}

/// Log archive configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Maximum number of archived entries
    pub archive_capacity: usize,
    /// Prefix for loggers created without an explicit one
    pub default_prefix: String,
    /// Initial debug flag for every logger
    pub debug: bool,
    /// Mirror archived entries to `tracing`
    pub console: bool,
    /// Optional file the host binary writes `tracing` output to
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            archive_capacity: LOG_ARCHIVE_CAPACITY,
            default_prefix: DEFAULT_LOG_PREFIX.to_string(),
            debug: false,
            console: true,
            log_file: None,
        }
    }
}

/// Navigation service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Maximum number of remembered navigation requests
    pub history_capacity: usize,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            history_capacity: NAVIGATION_HISTORY_CAPACITY,
        }
    }
}

/// Service provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Upper bound for one service start/stop during fan-out
    pub lifecycle_timeout_ms: u64,
}

impl ServicesConfig {
    pub fn lifecycle_timeout(&self) -> Duration {
        Duration::from_millis(self.lifecycle_timeout_ms)
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            lifecycle_timeout_ms: LIFECYCLE_TIMEOUT_MS,
        }
    }
}

/// REST service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestConfig {
    /// Prefix applied to relative request URLs
    pub base_url: Option<String>,
    pub request_timeout_ms: u64,
}

impl RestConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_ms: REQUEST_TIMEOUT_MS,
        }
    }
}

impl RuntimeConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(toml::from_str(content)?)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
    }

    /// Load from the default location, falling back to defaults when absent
    pub fn load_or_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => {
                info!("Runtime config file: {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = RuntimeConfig::from_toml_str("").expect("parse");
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.logging.archive_capacity, 5000);
        assert_eq!(config.navigation.history_capacity, 2000);
        assert_eq!(config.logging.default_prefix, "WEB");
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            [logging]
            archive_capacity = 10
            debug = true

            [rest]
            base_url = "http://localhost:8080/api/"
            "#,
        )
        .expect("parse");

        assert_eq!(config.logging.archive_capacity, 10);
        assert!(config.logging.debug);
        assert!(config.logging.console);
        assert_eq!(config.rest.base_url.as_deref(), Some("http://localhost:8080/api/"));
        assert_eq!(config.services.lifecycle_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        assert!(RuntimeConfig::from_toml_str("[logging]\narchive_capacity = \"many\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("runtime.toml");
        std::fs::write(&path, "[navigation]\nhistory_capacity = 3\n").expect("write");

        let config = RuntimeConfig::load(&path).expect("load");
        assert_eq!(config.navigation.history_capacity, 3);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(RuntimeConfig::load(&dir.path().join("absent.toml")).is_err());
    }
}
