//! Core types for the quill message log
//!
//! This crate defines the fundamental types used throughout the system:
//! - [`StreamKey`]: validated owner of a private sequence space
//! - [`Entry`]: one immutable appended record
//! - [`Timestamp`]: commit-time metadata (milliseconds since epoch)
//! - [`Error`] / [`Result`]: the canonical error taxonomy

#![warn(missing_docs)]

pub mod entry;
pub mod error;
pub mod types;

pub use entry::Entry;
pub use error::{Error, Result};
pub use types::{StreamKey, Timestamp, MAX_KEY_LEN};
