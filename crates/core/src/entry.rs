//! The appended record type
//!
//! Entries are immutable once committed. Each entry carries:
//! - the key whose sequence space it belongs to
//! - an opaque text payload supplied by the caller
//! - a 1-based sequence number assigned at append time (never by the caller)
//! - a commit-time timestamp (metadata only)

use crate::types::{StreamKey, Timestamp};
use serde::{Deserialize, Serialize};

/// One immutable record in a key's append-only log.
///
/// For a fixed key, committed sequence numbers are exactly `{1..count}` with
/// no gaps and no duplicates, and sequence order coincides with observed
/// append order. Entries are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Key owning the sequence space this entry belongs to.
    pub key: StreamKey,
    /// Opaque caller-supplied content.
    pub payload: String,
    /// 1-based position within the key's log. Assigned at append time.
    pub sequence: u64,
    /// Commit-time metadata. Ordering authority is `sequence`, not this.
    pub created_at: Timestamp,
}

impl Entry {
    /// Build an entry. Used by the engine at append time and by recovery.
    pub fn new(
        key: StreamKey,
        payload: impl Into<String>,
        sequence: u64,
        created_at: Timestamp,
    ) -> Self {
        Entry {
            key,
            payload: payload.into(),
            sequence,
            created_at,
        }
    }
}
