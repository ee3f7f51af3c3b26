//! Convenient imports for Quill.
//!
//! ```ignore
//! use quilldb::prelude::*;
//!
//! let db = Quill::ephemeral()?;
//! db.messages.submit("alice", "hi")?;
//! ```

// Main entry point
pub use crate::database::{Quill, QuillBuilder};

// Facade
pub use crate::messages::Messages;

// Error handling
pub use crate::{Error, Result};

// Core types
pub use crate::{Entry, StreamKey, Timestamp};

// Durability configuration
pub use crate::DurabilityMode;

// Wire-facing service
pub use crate::{
    wire_error, EntryRecord, MessageService, SubmitRequest, SubmitResponse, WireError,
    DEFAULT_RECENT_LIMIT,
};
