//! Wire-facing API for the quill message log
//!
//! The boundary consumed by a transport layer (HTTP or otherwise):
//! - [`MessageService`]: submit = append + recent history in one call
//! - wire DTOs with a stable JSON shape
//! - [`WireError`] with frozen canonical error codes

pub mod service;
pub mod wire;

pub use service::{MessageService, DEFAULT_RECENT_LIMIT};
pub use wire::{wire_error, EntryRecord, SubmitRequest, SubmitResponse, WireError};
