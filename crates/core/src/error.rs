//! Canonical error taxonomy
//!
//! Three categories matter to callers:
//! - [`Error::Validation`]: bad input, never retried, surfaced immediately
//! - [`Error::Conflict`]: a stale sequence computation detected by the
//!   storage constraint; the engine retries internally with a fresh
//!   computation and callers never see it from a successful append
//! - [`Error::Unavailable`]: the store could not commit (I/O failure, or
//!   conflict retries exhausted); retryable by the caller
//!
//! The remaining variants are substrate failures that surface through
//! `Unavailable` at the API boundary.

use thiserror::Error;

/// All quill errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad input: empty key, oversized key, non-positive limit.
    #[error("validation error: {0}")]
    Validation(String),

    /// The `(key, sequence)` constraint rejected a stale sequence
    /// computation. Retried internally with a fresh computation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The store could not be reached or the commit failed after allowed
    /// retries. The operation applied nothing; the caller may retry.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// I/O failure in the durability layer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Durable state failed an integrity check.
    #[error("corruption: {0}")]
    Corruption(String),

    /// Bug or invariant violation.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for quill operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether a retry with fresh state may succeed.
    ///
    /// Conflicts are retried by the engine; unavailability may be retried by
    /// the caller. Validation failures and corruption never benefit from a
    /// retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Conflict(_) | Error::Unavailable(_))
    }

    /// Whether this is a sequence-race conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }

    /// Whether this is an input-validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
