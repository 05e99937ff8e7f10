//! Error types for RF2 file processing.

use thiserror::Error;

/// A single-row decode failure, without file context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    /// Invalid SCTID format.
    #[error("invalid SCTID: {value}")]
    InvalidSctId {
        /// The invalid value that was encountered.
        value: String,
    },

    /// Invalid UUID format.
    #[error("invalid UUID: {value}")]
    InvalidUuid {
        /// The invalid value that was encountered.
        value: String,
    },

    /// Invalid basic-ISO date.
    #[error("invalid date: {value} (expected YYYYMMDD)")]
    InvalidDate {
        /// The invalid date value.
        value: String,
    },

    /// Invalid boolean value.
    #[error("invalid boolean: {value} (expected 0 or 1)")]
    InvalidBoolean {
        /// The invalid boolean value.
        value: String,
    },

    /// Invalid integer value.
    #[error("invalid integer: {value}")]
    InvalidInteger {
        /// The invalid integer value.
        value: String,
    },

    /// Invalid concrete value literal.
    #[error("invalid concrete value: {value}")]
    InvalidConcreteValue {
        /// The invalid literal.
        value: String,
    },

    /// Row is missing an expected column.
    #[error("missing column at index {index}")]
    MissingColumn {
        /// Zero-based column index.
        index: usize,
    },
}

/// Errors from RF2 classification, parsing and import.
#[derive(Error, Debug)]
pub enum Rf2Error {
    /// I/O error reading an RF2 file or walking a release directory.
    #[error("IO error reading RF2 data: {0}")]
    Io(#[from] std::io::Error),

    /// CSV-level read error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A row failed to decode; fatal to the whole import.
    #[error("parse error in {file}, line {line}: {cause}")]
    Parse {
        /// The offending file name.
        file: String,
        /// One-based data row number.
        line: u64,
        /// The underlying decode failure.
        cause: RowError,
    },

    /// The component sink rejected a batch.
    #[error("write failed: {message}")]
    Sink {
        /// Sink-reported failure description.
        message: String,
    },

    /// The import pipeline was cancelled before completion.
    #[error("import cancelled")]
    Cancelled,
}

/// Result type for RF2 operations.
pub type Rf2Result<T> = Result<T, Rf2Error>;
