//! Processor Error Types

use alarm_state::{HistoryError, StateError};
use event_normalizer::LookupError;
use event_store::StorageError;
use reliability_metrics::PublishError;
use thiserror::Error;

/// Errors surfaced by the dispatch layer
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid alarm name pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Invalid notification: {0}")]
    Notification(#[from] StateError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Metrics exporter setup failed: {0}")]
    Metrics(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
