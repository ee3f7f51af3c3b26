//! Crash recovery by WAL replay
//!
//! Rebuilds the committed entry history from a segment file. The commit
//! record is authoritative: appends are buffered per transaction and applied
//! only once the matching `Commit` is seen. Transactions that were aborted,
//! or that lost their tail to a crash before committing, are discarded and
//! consume no sequence numbers.
//!
//! After recovery the store must hold exactly a prefix of the committed
//! transaction history - no partial transactions are ever visible.

use crate::log::Wal;
use crate::record::WalRecord;
use quill_core::{Entry, Result};
use rustc_hash::FxHashMap;
use std::time::Instant;

/// What replay found in the segment file.
#[derive(Debug, Default, Clone)]
pub struct RecoveryReport {
    /// Frames read from the file
    pub records_replayed: u64,
    /// Transactions whose commit record was present
    pub transactions_recovered: u64,
    /// Transactions missing a commit record (discarded)
    pub orphaned_transactions: u64,
    /// Transactions explicitly aborted (discarded)
    pub aborted_transactions: u64,
    /// Whether a torn tail was truncated away
    pub truncated_tail: bool,
    /// Total recovery time in microseconds
    pub recovery_time_micros: u64,
    /// Highest transaction id seen; new ids must start above this
    pub max_txn_id: u64,
}

impl RecoveryReport {
    /// Human-readable one-line summary.
    pub fn summary(&self) -> String {
        format!(
            "Recovery complete: {} transactions, {} records, {} orphaned, {} aborted, {:.2}ms{}",
            self.transactions_recovered,
            self.records_replayed,
            self.orphaned_transactions,
            self.aborted_transactions,
            self.recovery_time_micros as f64 / 1000.0,
            if self.truncated_tail {
                " (torn tail truncated)"
            } else {
                ""
            }
        )
    }
}

/// Replay a segment file and return the committed entries in commit order.
///
/// # Errors
///
/// Propagates I/O and corruption errors from the underlying replay. A torn
/// tail is not an error; it is truncated and reported.
pub fn recover(wal: &mut Wal) -> Result<(Vec<Entry>, RecoveryReport)> {
    let started = Instant::now();
    let replay = wal.replay()?;

    let mut report = RecoveryReport {
        records_replayed: replay.records.len() as u64,
        truncated_tail: replay.truncated_tail,
        ..Default::default()
    };

    let mut pending: FxHashMap<u64, Vec<Entry>> = FxHashMap::default();
    let mut committed = Vec::new();

    for record in replay.records {
        report.max_txn_id = report.max_txn_id.max(record.txn_id());
        match record {
            WalRecord::Begin { txn_id, .. } => {
                pending.entry(txn_id).or_default();
            }
            WalRecord::Append {
                txn_id,
                key,
                sequence,
                payload,
                timestamp,
            } => {
                pending
                    .entry(txn_id)
                    .or_default()
                    .push(Entry::new(key, payload, sequence, timestamp));
            }
            WalRecord::Commit { txn_id } => match pending.remove(&txn_id) {
                Some(entries) => {
                    committed.extend(entries);
                    report.transactions_recovered += 1;
                }
                None => {
                    tracing::warn!(txn_id, "commit record without a transaction, ignoring");
                }
            },
            WalRecord::Abort { txn_id } => {
                if pending.remove(&txn_id).is_some() {
                    report.aborted_transactions += 1;
                }
            }
        }
    }

    report.orphaned_transactions = pending.len() as u64;
    report.recovery_time_micros = started.elapsed().as_micros() as u64;
    Ok((committed, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::{StreamKey, Timestamp};
    use tempfile::TempDir;

    fn write_txn(wal: &mut Wal, txn_id: u64, key: &str, seq: u64, commit: bool) {
        let ts = Timestamp::from_millis(1_700_000_000_000 + txn_id as i64);
        wal.append(&WalRecord::Begin {
            txn_id,
            timestamp: ts,
        })
        .unwrap();
        wal.append(&WalRecord::Append {
            txn_id,
            key: StreamKey::new(key).unwrap(),
            sequence: seq,
            payload: format!("payload {}", seq),
            timestamp: ts,
        })
        .unwrap();
        if commit {
            wal.append(&WalRecord::Commit { txn_id }).unwrap();
        }
        wal.sync().unwrap();
    }

    #[test]
    fn test_recover_empty_log() {
        let dir = TempDir::new().unwrap();
        let mut wal = Wal::open(dir.path().join("wal.qlog")).unwrap();

        let (entries, report) = recover(&mut wal).unwrap();
        assert!(entries.is_empty());
        assert_eq!(report.records_replayed, 0);
        assert_eq!(report.max_txn_id, 0);
    }

    #[test]
    fn test_recover_committed_transactions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.qlog");
        {
            let mut wal = Wal::open(&path).unwrap();
            write_txn(&mut wal, 1, "alice", 1, true);
            write_txn(&mut wal, 2, "alice", 2, true);
            write_txn(&mut wal, 3, "bob", 1, true);
        }

        let mut wal = Wal::open(&path).unwrap();
        let (entries, report) = recover(&mut wal).unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(report.transactions_recovered, 3);
        assert_eq!(report.orphaned_transactions, 0);
        assert_eq!(report.max_txn_id, 3);

        // Commit order is preserved.
        assert_eq!(entries[0].key.as_str(), "alice");
        assert_eq!(entries[0].sequence, 1);
        assert_eq!(entries[1].sequence, 2);
        assert_eq!(entries[2].key.as_str(), "bob");
    }

    #[test]
    fn test_orphaned_transaction_discarded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.qlog");
        {
            let mut wal = Wal::open(&path).unwrap();
            write_txn(&mut wal, 1, "alice", 1, true);
            // Crash before commit: the append is in the log, the commit is not.
            write_txn(&mut wal, 2, "alice", 2, false);
        }

        let mut wal = Wal::open(&path).unwrap();
        let (entries, report) = recover(&mut wal).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].sequence, 1);
        assert_eq!(report.transactions_recovered, 1);
        assert_eq!(report.orphaned_transactions, 1);
    }

    #[test]
    fn test_aborted_transaction_discarded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.qlog");
        {
            let mut wal = Wal::open(&path).unwrap();
            write_txn(&mut wal, 1, "alice", 1, false);
            wal.append(&WalRecord::Abort { txn_id: 1 }).unwrap();
            write_txn(&mut wal, 2, "alice", 1, true);
        }

        let mut wal = Wal::open(&path).unwrap();
        let (entries, report) = recover(&mut wal).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(report.aborted_transactions, 1);
        assert_eq!(report.transactions_recovered, 1);
        // The aborted attempt did not consume sequence 1.
        assert_eq!(entries[0].sequence, 1);
    }

    #[test]
    fn test_interleaved_transactions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.qlog");
        let ts = Timestamp::from_millis(0);
        {
            let mut wal = Wal::open(&path).unwrap();
            // Two appenders for different keys interleave their records.
            wal.append(&WalRecord::Begin { txn_id: 1, timestamp: ts }).unwrap();
            wal.append(&WalRecord::Begin { txn_id: 2, timestamp: ts }).unwrap();
            wal.append(&WalRecord::Append {
                txn_id: 2,
                key: StreamKey::new("bob").unwrap(),
                sequence: 1,
                payload: "yo".to_string(),
                timestamp: ts,
            })
            .unwrap();
            wal.append(&WalRecord::Append {
                txn_id: 1,
                key: StreamKey::new("alice").unwrap(),
                sequence: 1,
                payload: "hi".to_string(),
                timestamp: ts,
            })
            .unwrap();
            wal.append(&WalRecord::Commit { txn_id: 2 }).unwrap();
            wal.append(&WalRecord::Commit { txn_id: 1 }).unwrap();
            wal.sync().unwrap();
        }

        let mut wal = Wal::open(&path).unwrap();
        let (entries, report) = recover(&mut wal).unwrap();

        assert_eq!(report.transactions_recovered, 2);
        assert_eq!(entries.len(), 2);
        // Commit order: bob's transaction committed first.
        assert_eq!(entries[0].key.as_str(), "bob");
        assert_eq!(entries[1].key.as_str(), "alice");
    }

    #[test]
    fn test_summary_mentions_truncation() {
        let report = RecoveryReport {
            transactions_recovered: 2,
            records_replayed: 6,
            truncated_tail: true,
            ..Default::default()
        };
        let summary = report.summary();
        assert!(summary.contains("2 transactions"));
        assert!(summary.contains("torn tail truncated"));
    }
}
