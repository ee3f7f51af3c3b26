//! The submit boundary
//!
//! `submit` is the externally observed behavior of the system: append the
//! payload, then return the key's recent history (not just the new entry),
//! so one request/response cycle both writes and reads.

use crate::wire::{EntryRecord, SubmitResponse};
use quill_core::{Error, Result};
use quill_engine::Database;
use std::sync::Arc;

/// History window returned by [`MessageService::submit`] and used by
/// [`MessageService::recent_history`] when the caller passes no limit.
pub const DEFAULT_RECENT_LIMIT: u64 = 10;

/// Wire-facing operations over a shared database handle.
///
/// Cheap to clone; every clone sees the same store.
#[derive(Debug, Clone)]
pub struct MessageService {
    db: Arc<Database>,
}

impl MessageService {
    /// Create a service over a database handle.
    pub fn new(db: Arc<Database>) -> Self {
        MessageService { db }
    }

    /// Append a payload under a key, then return the key's recent history
    /// (up to [`DEFAULT_RECENT_LIMIT`] entries, descending by sequence,
    /// including the entry just appended).
    pub fn submit(&self, key: &str, payload: &str) -> Result<SubmitResponse> {
        let entry = self.db.append(key, payload)?;
        tracing::debug!(key, sequence = entry.sequence, "submit committed");

        let entries = self
            .db
            .recent(key, DEFAULT_RECENT_LIMIT)?
            .into_iter()
            .map(EntryRecord::from)
            .collect();
        Ok(SubmitResponse { entries })
    }

    /// The most recent entries for a key, descending by sequence.
    ///
    /// `limit = None` applies [`DEFAULT_RECENT_LIMIT`]; an explicit zero is
    /// rejected as validation failure.
    pub fn recent_history(&self, key: &str, limit: Option<u64>) -> Result<Vec<EntryRecord>> {
        let limit = match limit {
            Some(0) => return Err(Error::Validation("limit must be positive".to_string())),
            Some(n) => n,
            None => DEFAULT_RECENT_LIMIT,
        };
        Ok(self
            .db
            .recent(key, limit)?
            .into_iter()
            .map(EntryRecord::from)
            .collect())
    }

    /// Append without reading history back.
    pub fn append(&self, key: &str, payload: &str) -> Result<EntryRecord> {
        Ok(EntryRecord::from(self.db.append(key, payload)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> MessageService {
        MessageService::new(Arc::new(Database::ephemeral().unwrap()))
    }

    #[test]
    fn test_submit_returns_history_including_new_entry() {
        let svc = service();

        let first = svc.submit("alice", "hi").unwrap();
        assert_eq!(first.entries.len(), 1);
        assert_eq!(first.entries[0].sequence, 1);
        assert_eq!(first.entries[0].payload, "hi");

        let second = svc.submit("alice", "there").unwrap();
        assert_eq!(second.entries.len(), 2);
        assert_eq!(second.entries[0].sequence, 2);
        assert_eq!(second.entries[0].payload, "there");
        assert_eq!(second.entries[1].sequence, 1);
    }

    #[test]
    fn test_submit_window_is_bounded() {
        let svc = service();
        for i in 1..=25 {
            svc.submit("alice", &format!("message {}", i)).unwrap();
        }

        let response = svc.submit("alice", "message 26").unwrap();
        assert_eq!(response.entries.len(), DEFAULT_RECENT_LIMIT as usize);
        let sequences: Vec<u64> = response.entries.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, (17..=26).rev().collect::<Vec<_>>());
    }

    #[test]
    fn test_keys_are_independent() {
        let svc = service();
        svc.submit("alice", "hi").unwrap();
        svc.submit("alice", "there").unwrap();

        let bob = svc.submit("bob", "yo").unwrap();
        assert_eq!(bob.entries.len(), 1);
        assert_eq!(bob.entries[0].sequence, 1);
    }

    #[test]
    fn test_recent_history_default_limit() {
        let svc = service();
        for i in 1..=15 {
            svc.append("alice", &format!("m{}", i)).unwrap();
        }

        let history = svc.recent_history("alice", None).unwrap();
        assert_eq!(history.len(), DEFAULT_RECENT_LIMIT as usize);
    }

    #[test]
    fn test_recent_history_explicit_limit() {
        let svc = service();
        for i in 1..=15 {
            svc.append("alice", &format!("m{}", i)).unwrap();
        }

        let history = svc.recent_history("alice", Some(3)).unwrap();
        let sequences: Vec<u64> = history.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![15, 14, 13]);
    }

    #[test]
    fn test_recent_history_zero_limit_rejected() {
        let svc = service();
        let err = svc.recent_history("alice", Some(0)).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_recent_history_unknown_key_is_empty() {
        let svc = service();
        assert!(svc.recent_history("nonexistent", None).unwrap().is_empty());
    }

    #[test]
    fn test_submit_empty_key_rejected() {
        let svc = service();
        let err = svc.submit("", "hi").unwrap_err();
        assert!(err.is_validation());
    }
}
