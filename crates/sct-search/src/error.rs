//! Search index error types.

use thiserror::Error;

/// Errors from index creation, writing and searching.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Underlying tantivy failure.
    #[error("index error: {0}")]
    Index(#[from] tantivy::TantivyError),

    /// Filesystem failure around an index directory.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query referenced a field the index does not carry.
    #[error("unknown index field: {name}")]
    UnknownField {
        /// The requested field name.
        name: String,
    },

    /// A malformed wildcard or regex pattern.
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
}

/// Result type for search operations.
pub type SearchResult<T> = Result<T, SearchError>;
