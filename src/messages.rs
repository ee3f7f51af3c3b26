//! Message operations facade.
//!
//! Access via `db.messages`. Works in domain types ([`Entry`]); transport
//! layers wanting wire DTOs use [`crate::MessageService`] instead.

use crate::{Entry, Result, DEFAULT_RECENT_LIMIT};
use std::sync::Arc;

/// Message-log operations over a shared database handle.
pub struct Messages {
    db: Arc<quill_engine::Database>,
}

impl Messages {
    pub(crate) fn new(db: Arc<quill_engine::Database>) -> Self {
        Messages { db }
    }

    /// Append a payload under a key.
    ///
    /// Returns the committed entry with its assigned sequence number.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let entry = db.messages.append("alice", "hi")?;
    /// assert_eq!(entry.sequence, 1);
    /// ```
    pub fn append(&self, key: &str, payload: impl Into<String>) -> Result<Entry> {
        self.db.append(key, payload)
    }

    /// Post a message and read the recent history back in one call.
    ///
    /// Appends, then returns up to [`DEFAULT_RECENT_LIMIT`] entries for the
    /// key, descending by sequence, including the entry just appended.
    pub fn submit(&self, key: &str, payload: impl Into<String>) -> Result<Vec<Entry>> {
        self.db.append(key, payload)?;
        self.db.recent(key, DEFAULT_RECENT_LIMIT)
    }

    /// The `limit` most recent entries for a key, descending by sequence.
    ///
    /// Unknown keys yield an empty vec, not an error.
    pub fn recent(&self, key: &str, limit: u64) -> Result<Vec<Entry>> {
        self.db.recent(key, limit)
    }

    /// Highest committed sequence for a key, 0 if the key has none.
    pub fn head(&self, key: &str) -> Result<u64> {
        self.db.head(key)
    }

    /// Number of committed entries for a key.
    pub fn len(&self, key: &str) -> Result<u64> {
        self.db.len(key)
    }
}
