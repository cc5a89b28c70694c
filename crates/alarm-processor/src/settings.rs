//! Processor configuration

use crate::error::ProcessorError;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable honoured for the alarm name blacklist
pub const LEGACY_BLACKLIST_VAR: &str = "ALARM_NAME_BLACKLIST_PATTERN";

/// Prefix of environment overrides (`ALARM_METRICS_METRIC_NAMESPACE`, ...)
pub const ENV_PREFIX: &str = "ALARM_METRICS";

/// Processor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Alarms whose name matches are not processed
    pub alarm_name_blacklist_pattern: Option<String>,
    /// Namespace duration metrics are published under
    pub metric_namespace: String,
    /// Table holding transition events
    pub event_table: String,
    /// SQLite URL; in-memory store when unset
    pub database_url: Option<String>,
    /// Prometheus exporter listen address, e.g. `0.0.0.0:9000`
    pub metrics_listen_addr: Option<String>,
    /// History entries kept per alarm by the in-process history
    pub history_capacity: usize,
    pub logging: LoggingConfig,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            alarm_name_blacklist_pattern: None,
            metric_namespace: "Operations".to_string(),
            event_table: "EventStore".to_string(),
            database_url: None,
            metrics_listen_addr: None,
            history_capacity: 1000,
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `alarm_processor=debug`
    pub level: String,
    /// Emit JSON lines instead of text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl ProcessorConfig {
    /// Load defaults, then `path` if given, then the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ProcessorError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option(
                "alarm_name_blacklist_pattern",
                std::env::var(LEGACY_BLACKLIST_VAR).ok(),
            )?
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Blacklist pattern, if one is set and non-empty
    pub fn blacklist_pattern(&self) -> Option<&str> {
        self.alarm_name_blacklist_pattern
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}
