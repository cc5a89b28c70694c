//! Prior State Lookup Errors

use alarm_state::HistoryError;
use event_store::StorageError;
use thiserror::Error;

/// Errors while resolving the prior state of an alarm
#[derive(Debug, Error)]
pub enum LookupError {
    /// Last-known-record read failed
    #[error("Store lookup failed: {0}")]
    Store(#[from] StorageError),

    /// History read failed
    #[error("History lookup failed: {0}")]
    History(#[from] HistoryError),
}
