//! Alarm State Error Types

use thiserror::Error;

/// Errors while interpreting alarm notifications
#[derive(Debug, Clone, Error)]
pub enum StateError {
    /// State value is not one of OK, ALARM, INSUFFICIENT_DATA
    #[error("Unknown alarm state: {0}")]
    UnknownState(String),

    /// Timestamp could not be parsed
    #[error("Invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },

    /// Notification payload is not a valid alarm state change
    #[error("Malformed notification: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        StateError::Malformed(err.to_string())
    }
}

/// Errors raised by alarm history sources
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The history backend could not be reached
    #[error("History lookup failed for {alarm}: {reason}")]
    Lookup { alarm: String, reason: String },

    /// A history entry carried unreadable state data
    #[error("Invalid history data: {0}")]
    InvalidData(String),
}

impl From<serde_json::Error> for HistoryError {
    fn from(err: serde_json::Error) -> Self {
        HistoryError::InvalidData(err.to_string())
    }
}

impl From<StateError> for HistoryError {
    fn from(err: StateError) -> Self {
        HistoryError::InvalidData(err.to_string())
    }
}
