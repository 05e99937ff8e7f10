//! Store error types.

use thiserror::Error;

/// Errors from the persistent component store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Storage engine failure.
    #[error("storage error: {0}")]
    Storage(#[from] heed::Error),

    /// Filesystem failure around the database directory.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A component could not be written even in isolation.
    #[error("cannot write {kind} {id}: {source}")]
    BadComponent {
        /// Component kind, for diagnostics.
        kind: &'static str,
        /// Component identifier rendered as text.
        id: String,
        /// The underlying storage failure.
        source: heed::Error,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
