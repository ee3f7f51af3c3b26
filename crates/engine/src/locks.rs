//! Per-key append locks
//!
//! The per-key "current head" is the only contended resource in the system,
//! so the lock is scoped to exactly that: one mutex per key, created lazily,
//! held only for the allocate-sequence + commit + apply critical section.
//! Appenders of different keys never contend; a store-wide lock would be
//! correct but serialize unrelated keys.

use dashmap::DashMap;
use parking_lot::Mutex;
use quill_core::StreamKey;
use std::sync::Arc;

/// Lazily populated table of per-key append locks.
#[derive(Debug, Default)]
pub struct StreamLocks {
    locks: DashMap<StreamKey, Arc<Mutex<()>>>,
}

impl StreamLocks {
    /// Create an empty lock table.
    pub fn new() -> Self {
        StreamLocks {
            locks: DashMap::new(),
        }
    }

    /// Get the lock for a key, creating it on first use.
    ///
    /// Returns a clone of the `Arc` so the caller can lock it without
    /// holding any reference into the table.
    pub fn acquire(&self, key: &StreamKey) -> Arc<Mutex<()>> {
        self.locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Number of keys that have ever taken a lock.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no key has taken a lock yet.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
