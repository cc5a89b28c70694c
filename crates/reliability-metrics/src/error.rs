//! Metric Publishing Error Types

use thiserror::Error;

/// Errors while publishing a duration metric
#[derive(Debug, Error)]
pub enum PublishError {
    /// Sink refused the data point
    #[error("Metric {metric} rejected: {reason}")]
    Rejected { metric: String, reason: String },

    /// Sink could not be reached
    #[error("Metric sink unavailable: {0}")]
    Unavailable(String),
}
