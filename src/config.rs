//! Operator configuration.
//!
//! Every field has a default, so an empty document is a valid configuration and a
//! partial one overrides only what it names.
//!
//! ```toml
//! admission_timeout_ms = 500
//!
//! [store_controller]
//! max_concurrent_reconciles = 1
//! ```

use crate::framework::Backoff;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tunables for the whole operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// Request channel capacity of each store actor.
    #[serde(default = "default_store_buffer_size")]
    pub store_buffer_size: usize,

    /// Change-event capacity of each store actor before watchers lag.
    #[serde(default = "default_watch_capacity")]
    pub watch_capacity: usize,

    /// Deadline for reading a `copyOf` target during admission.
    #[serde(default = "default_admission_timeout_ms")]
    pub admission_timeout_ms: u64,

    #[serde(default)]
    pub item_controller: ControllerConfig,

    #[serde(default)]
    pub store_controller: ControllerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default = "default_max_concurrent_reconciles")]
    pub max_concurrent_reconciles: usize,

    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

const fn default_store_buffer_size() -> usize {
    32
}

const fn default_watch_capacity() -> usize {
    256
}

const fn default_admission_timeout_ms() -> u64 {
    2000
}

const fn default_max_concurrent_reconciles() -> usize {
    4
}

const fn default_backoff_base_ms() -> u64 {
    100
}

const fn default_backoff_max_ms() -> u64 {
    30_000
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            store_buffer_size: default_store_buffer_size(),
            watch_capacity: default_watch_capacity(),
            admission_timeout_ms: default_admission_timeout_ms(),
            item_controller: ControllerConfig::default(),
            store_controller: ControllerConfig::default(),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_reconciles: default_max_concurrent_reconciles(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

impl OperatorConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn admission_timeout(&self) -> Duration {
        Duration::from_millis(self.admission_timeout_ms)
    }
}

impl ControllerConfig {
    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_millis(self.backoff_base_ms),
            Duration::from_millis(self.backoff_max_ms),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = OperatorConfig::from_toml_str("").unwrap();
        assert_eq!(config, OperatorConfig::default());
        assert_eq!(config.store_buffer_size, 32);
        assert_eq!(config.watch_capacity, 256);
        assert_eq!(config.admission_timeout(), Duration::from_secs(2));
        assert_eq!(config.item_controller.max_concurrent_reconciles, 4);
    }

    #[test]
    fn test_partial_document_overrides_named_fields() {
        let config = OperatorConfig::from_toml_str(
            r#"
            admission_timeout_ms = 500

            [store_controller]
            backoff_base_ms = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.admission_timeout_ms, 500);
        assert_eq!(config.watch_capacity, 256);
        assert_eq!(config.store_controller.backoff_base_ms, 10);
        assert_eq!(config.store_controller.backoff_max_ms, 30_000);
        assert_eq!(config.item_controller, ControllerConfig::default());
        assert_eq!(
            config.store_controller.backoff(),
            Backoff::new(Duration::from_millis(10), Duration::from_secs(30))
        );
    }

    #[test]
    fn test_malformed_document_is_rejected() {
        let err = OperatorConfig::from_toml_str("watch_capacity = \"lots\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = OperatorConfig::load("/nonexistent/catalog-operator.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
