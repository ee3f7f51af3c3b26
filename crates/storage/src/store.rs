//! Sharded stream store
//!
//! One shard per key in a DashMap: readers of one key never contend with
//! writers of another, and reads are lock-free via the map's read guards.
//!
//! # Design
//!
//! A shard stores its entries in a `Vec` ordered by sequence, with the
//! correspondence `entries[i].sequence == i + 1`. That makes the uniqueness
//! and contiguity constraint a single comparison at insert, `head` an O(1)
//! length read, and the recent-window read an O(limit) slice.
//!
//! The store itself performs no sequence allocation. Callers present a fully
//! formed entry; `insert` accepts it only when its sequence is exactly
//! `head + 1` and rejects everything else with a conflict. Allocation and
//! locking discipline live in the engine.

use dashmap::DashMap;
use quill_core::{Entry, Error, Result, StreamKey};

/// Per-key shard holding a key's committed entries in sequence order.
#[derive(Debug, Default)]
struct StreamShard {
    entries: Vec<Entry>,
}

impl StreamShard {
    /// Highest committed sequence, 0 when empty.
    fn head(&self) -> u64 {
        self.entries.len() as u64
    }
}

/// Shared store of per-key append-only logs.
///
/// # Thread Safety
///
/// All operations are `&self` and thread-safe. Writes lock only the target
/// key's shard; different keys never contend.
#[derive(Debug, Default)]
pub struct StreamStore {
    shards: DashMap<StreamKey, StreamShard>,
}

impl StreamStore {
    /// Create an empty store.
    pub fn new() -> Self {
        StreamStore {
            shards: DashMap::new(),
        }
    }

    /// Highest committed sequence for a key, 0 when the key has no entries.
    pub fn head(&self, key: &str) -> u64 {
        self.shards.get(key).map(|s| s.head()).unwrap_or(0)
    }

    /// Number of committed entries for a key.
    pub fn len(&self, key: &str) -> u64 {
        self.head(key)
    }

    /// Whether the store holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.total_entries() == 0
    }

    /// Insert a committed entry, enforcing the `(key, sequence)` constraint.
    ///
    /// The entry's sequence must be exactly `head + 1` for its key. A lower
    /// sequence is a duplicate, a higher one a gap; both are rejected with
    /// [`Error::Conflict`] and nothing is applied.
    pub fn insert(&self, entry: Entry) -> Result<()> {
        let mut shard = self.shards.entry(entry.key.clone()).or_default();
        let head = shard.head();
        if entry.sequence != head + 1 {
            tracing::debug!(
                key = %entry.key,
                sequence = entry.sequence,
                head,
                "constraint rejected stale sequence"
            );
            let reason = if entry.sequence <= head {
                format!(
                    "sequence {} already committed for '{}' (head {})",
                    entry.sequence, entry.key, head
                )
            } else {
                format!(
                    "sequence {} would leave a gap for '{}' (head {})",
                    entry.sequence, entry.key, head
                )
            };
            return Err(Error::Conflict(reason));
        }
        shard.entries.push(entry);
        Ok(())
    }

    /// The `limit` highest-sequence entries for a key, descending.
    ///
    /// Returns fewer than `limit` when fewer exist, and an empty vec for an
    /// unknown key. Each call re-reads current committed state.
    pub fn recent(&self, key: &str, limit: usize) -> Vec<Entry> {
        self.shards
            .get(key)
            .map(|shard| {
                shard
                    .entries
                    .iter()
                    .rev()
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All entries for a key in ascending sequence order.
    ///
    /// Full copy of the shard; meant for recovery verification and tests,
    /// not the request path.
    pub fn scan(&self, key: &str) -> Vec<Entry> {
        self.shards
            .get(key)
            .map(|shard| shard.entries.clone())
            .unwrap_or_default()
    }

    /// All keys that currently hold at least one entry, unordered.
    pub fn stream_names(&self) -> Vec<StreamKey> {
        self.shards.iter().map(|e| e.key().clone()).collect()
    }

    /// Total entries across all keys.
    pub fn total_entries(&self) -> usize {
        self.shards.iter().map(|e| e.value().entries.len()).sum()
    }
}
