//! Error types for the sync layer.

use ledgerbridge_store::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
///
/// Every variant except `Config` and `RunInProgress` is scoped to a
/// single (company, domain) unit of work: the orchestrator turns it into
/// an audit event and moves on to the next unit.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The ERP agent could not be reached or returned something unusable.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The fetch succeeded but returned zero records.
    #[error("fetch returned an empty result")]
    EmptyResult,

    /// The cloud endpoint rejected a batch or could not be reached.
    #[error("delivery failed at batch {batch}/{total} after {delivered} records: {reason}")]
    Delivery {
        /// 1-based index of the failing batch.
        batch: usize,
        total: usize,
        /// Records accepted by earlier batches of the same delivery.
        delivered: usize,
        reason: String,
    },

    /// Fingerprint store read or write failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client could not be built.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Another run holds the in-progress guard.
    #[error("a sync run is already in progress")]
    RunInProgress,
}
