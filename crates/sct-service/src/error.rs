//! Service error taxonomy.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the terminology service.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// No database exists at the given path.
    #[error("no terminology database found at {path}")]
    NotFound {
        /// The path that was opened.
        path: PathBuf,
    },

    /// The manifest version does not match this build.
    #[error("incompatible database version: expected {expected}, found {found}")]
    IncompatibleVersion {
        /// Version this build expects.
        expected: String,
        /// Version found in the manifest.
        found: String,
    },

    /// The manifest exists but cannot be read.
    #[error("corrupt manifest at {path}: {cause}")]
    CorruptManifest {
        /// The manifest path.
        path: PathBuf,
        /// Underlying failure description.
        cause: String,
    },

    /// RF2 parsing or import failure.
    #[error(transparent)]
    Rf2(#[from] sct_rf2::Rf2Error),

    /// ECL expression failed to parse.
    #[error(transparent)]
    InvalidEcl(#[from] sct_ecl::EclError),

    /// Search index failure.
    #[error(transparent)]
    Index(#[from] sct_search::SearchError),

    /// Component store failure.
    #[error(transparent)]
    Store(#[from] sct_store::StoreError),

    /// Filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
