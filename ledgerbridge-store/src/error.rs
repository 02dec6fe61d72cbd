//! Error types for the fingerprint store.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur reading or writing persisted fingerprints.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot file could not be parsed or written as JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A persisted value is not a valid fingerprint or key.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A previous writer panicked while holding the store lock.
    #[error("store lock poisoned")]
    Poisoned,
}
