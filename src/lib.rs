//! # Quill
//!
//! Embedded append-only message log with per-key sequence numbers.
//!
//! Quill stores immutable entries under string keys. Each key owns a private
//! sequence space: appends are assigned 1-based, contiguous, strictly
//! increasing sequence numbers, correct under any number of concurrent
//! writers sharing the store. Reads return the most recent entries for a key
//! in descending sequence order.
//!
//! ## Quick Start
//!
//! ```ignore
//! use quilldb::prelude::*;
//!
//! // Open a durable database
//! let db = Quill::open("./messages")?;
//!
//! // Post a message and get the recent history back
//! let history = db.messages.submit("alice", "hi")?;
//! assert_eq!(history[0].sequence, 1);
//!
//! // Read-only history access
//! let recent = db.messages.recent("alice", 10)?;
//!
//! // Graceful shutdown
//! db.close()?;
//! ```
//!
//! ## Guarantees
//!
//! - For a fixed key, committed sequence numbers are exactly `{1..count}`:
//!   no gaps, no duplicates, regardless of writer concurrency.
//! - An acknowledged append orders before any append that starts later.
//! - A successful append is immediately visible to history reads.
//! - Timestamps are metadata; sequence is the only ordering authority.

#![warn(missing_docs)]

mod database;
mod messages;

pub mod prelude;

// Main entry points
pub use database::{Quill, QuillBuilder};
pub use messages::Messages;

// Core types and errors
pub use quill_core::{Entry, Error, Result, StreamKey, Timestamp};

// Durability configuration
pub use quill_engine::DurabilityMode;

// Wire-facing service for transport layers
pub use quill_api::{
    wire_error, EntryRecord, MessageService, SubmitRequest, SubmitResponse, WireError,
    DEFAULT_RECENT_LIMIT,
};
