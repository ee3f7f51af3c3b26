//! WAL record types
//!
//! Each append runs as one transaction in the log:
//! - `Begin`: transaction start
//! - `Append`: the entry being committed, with its assigned sequence
//! - `Commit`: successful completion - the durability point
//! - `Abort`: explicit rollback; replay discards the transaction
//!
//! Records carry the transaction id so replay can group an `Append` with its
//! boundary records even if transactions from different keys interleave in
//! the file.

use quill_core::{StreamKey, Timestamp};
use serde::{Deserialize, Serialize};

/// One record in the write-ahead log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum WalRecord {
    /// Begin an append transaction.
    Begin {
        /// Transaction identifier, unique within a store
        txn_id: u64,
        /// When the transaction started
        timestamp: Timestamp,
    },

    /// The appended entry with its assigned sequence number.
    Append {
        /// Transaction this append belongs to
        txn_id: u64,
        /// Key owning the sequence space
        key: StreamKey,
        /// Assigned 1-based sequence number
        sequence: u64,
        /// Caller-supplied content
        payload: String,
        /// Commit-time metadata
        timestamp: Timestamp,
    },

    /// Commit the transaction. Once this record is durable, the append is.
    Commit {
        /// Transaction identifier
        txn_id: u64,
    },

    /// Roll the transaction back. Replay discards its appends.
    Abort {
        /// Transaction identifier
        txn_id: u64,
    },
}

impl WalRecord {
    /// The transaction this record belongs to.
    pub fn txn_id(&self) -> u64 {
        match self {
            WalRecord::Begin { txn_id, .. }
            | WalRecord::Append { txn_id, .. }
            | WalRecord::Commit { txn_id }
            | WalRecord::Abort { txn_id } => *txn_id,
        }
    }

    /// Whether this record opens or closes a transaction.
    pub fn is_boundary(&self) -> bool {
        matches!(
            self,
            WalRecord::Begin { .. } | WalRecord::Commit { .. } | WalRecord::Abort { .. }
        )
    }
}
