//! Syntax error types.

use thiserror::Error;

/// An ECL expression failed to parse.
///
/// Carries the byte offset of the failure so callers can point at the
/// offending input. Parse failures are values, never panics, so query
/// pipelines can drain them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("ECL syntax error at position {position}: {reason}")]
pub struct EclError {
    /// Byte offset into the input where parsing failed.
    pub position: usize,
    /// Human-readable failure description.
    pub reason: String,
}

/// An SCG expression failed to parse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("SCG syntax error at position {position}: {reason}")]
pub struct ScgError {
    /// Byte offset into the input where parsing failed.
    pub position: usize,
    /// Human-readable failure description.
    pub reason: String,
}
