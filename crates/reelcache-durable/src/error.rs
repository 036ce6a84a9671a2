//! Error types for durable key/value storage.

use thiserror::Error;

/// Errors that a durable key/value backend may report.
///
/// Callers in the cache layer treat every variant as a miss or a no-op.
#[derive(Error, Debug)]
pub enum DurableError {
    /// Storage is disabled or not reachable.
    #[error("Durable storage unavailable")]
    Unavailable,

    /// Write rejected because it would exceed the configured quota.
    #[error("Quota exceeded writing {key}: {needed} bytes needed, limit is {limit}")]
    QuotaExceeded {
        /// Key that was being written.
        key: String,
        /// Total bytes the store would hold after the write.
        needed: usize,
        /// Configured byte limit.
        limit: usize,
    },

    /// Failed to acquire the backend lock.
    #[error("Storage lock error")]
    LockError,

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Backing document could not be parsed or written.
    #[error("Invalid storage document: {0}")]
    Json(#[from] serde_json::Error),

    /// Atomic replace of the backing file failed.
    #[error("Failed to persist storage file: {0}")]
    Persist(#[from] tempfile::PersistError),
}
