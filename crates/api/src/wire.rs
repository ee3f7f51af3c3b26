//! Wire types and error encoding
//!
//! ## Wire Format
//!
//! All errors encode to JSON as:
//! ```json
//! {
//!   "code": "ValidationError",
//!   "message": "validation error: key must not be empty",
//!   "details": {"reason": "key must not be empty"}
//! }
//! ```
//!
//! ## Error Codes (Canonical)
//!
//! These codes are frozen and must not change:
//!
//! | Code | Description |
//! |------|-------------|
//! | ValidationError | Bad input (empty key, non-positive limit); not retryable |
//! | ConflictError | Sequence race detected; retried internally before surfacing |
//! | StorageUnavailable | The store could not commit; retryable by the caller |
//! | Corruption | Durable state failed an integrity check |
//! | Internal | Bug or invariant violation |

use quill_core::{Entry, Error};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Inbound submit call: post a payload under a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitRequest {
    /// Key owning the sequence space
    pub key: String,
    /// Opaque text content
    pub payload: String,
}

/// One entry as seen on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRecord {
    /// Key owning the sequence space
    pub key: String,
    /// Opaque text content
    pub payload: String,
    /// Assigned 1-based sequence number
    pub sequence: u64,
    /// Commit time, milliseconds since the Unix epoch
    pub created_at: i64,
}

impl From<Entry> for EntryRecord {
    fn from(entry: Entry) -> Self {
        EntryRecord {
            created_at: entry.created_at.as_millis(),
            sequence: entry.sequence,
            payload: entry.payload,
            key: entry.key.into_string(),
        }
    }
}

/// Response to a submit call: the recent history including the new entry,
/// descending by sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// Recent entries, highest sequence first
    pub entries: Vec<EntryRecord>,
}

/// Wire error representation for JSON encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireError {
    /// The canonical error code (see module docs)
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional structured details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Encode an error with its canonical code.
pub fn wire_error(err: &Error) -> WireError {
    let (code, details) = match err {
        Error::Validation(reason) => ("ValidationError", Some(json!({ "reason": reason }))),
        Error::Conflict(reason) => ("ConflictError", Some(json!({ "reason": reason }))),
        Error::Unavailable(reason) => ("StorageUnavailable", Some(json!({ "reason": reason }))),
        // Substrate failures surface as unavailability: the caller cannot
        // act on I/O detail beyond retrying later.
        Error::Io(_) | Error::Serialization(_) => ("StorageUnavailable", None),
        Error::Corruption(reason) => ("Corruption", Some(json!({ "reason": reason }))),
        Error::Internal(_) => ("Internal", None),
    };
    WireError {
        code: code.to_string(),
        message: err.to_string(),
        details,
    }
}
