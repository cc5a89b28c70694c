//! Transition Event Store
//!
//! Persists normalized alarm transitions and answers "what was the last
//! recorded transition for this alarm".

mod event;
mod repository;
mod sqlite;

pub use event::TransitionEvent;
pub use repository::{MemoryStore, TransitionStore};
pub use sqlite::SqliteStore;

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Record not found")]
    NotFound,
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Invalid table name: {0}")]
    InvalidTable(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StorageError::NotFound,
            other => StorageError::DatabaseError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::SerializationError(err.to_string())
    }
}
