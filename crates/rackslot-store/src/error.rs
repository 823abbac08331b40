//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A batch exceeded the backend's write limit. Nothing was written.
    #[error("batch of {len} writes exceeds the limit of {max}")]
    BatchTooLarge { len: usize, max: usize },

    /// A conditional write in the batch did not hold. Nothing was written.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// The backend could not be reached (poisoned lock or injected outage).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Filesystem error while preparing the database location.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking worker panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    Join(String),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
