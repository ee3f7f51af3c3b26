//! The database: open/recovery, the append commit protocol, reads
//!
//! ## Commit Sequence
//!
//! Every append runs as one transaction under its key's lock:
//!
//! ```text
//! 1. acquire the key's append lock
//! 2. next = store head + 1        (read-max inside the critical section)
//! 3. stamp created_at, build the entry
//! 4. WAL: Begin, Append, Commit   (DURABILITY POINT at the commit fsync)
//! 5. apply to the in-memory store (constraint re-checks contiguity)
//! 6. release the lock
//! ```
//!
//! If step 4 fails, nothing was applied and the sequence number is not
//! consumed. After step 4 succeeds the transaction is durable: even if the
//! process dies before step 5, recovery replays it from the log.
//!
//! ## Concurrency
//!
//! The per-key lock makes read-max + commit + apply atomic with respect to
//! other appenders of the same key, so two transactions can never observe
//! the same head. The storage constraint is an independent backstop: any
//! stale sequence computation becomes a conflict for the bounded retry loop
//! in [`Database::append`] rather than silent duplicate/out-of-order state.
//! Appenders of different keys share nothing but the WAL file mutex.

use crate::locks::StreamLocks;
use parking_lot::Mutex;
use quill_core::{Entry, Error, Result, StreamKey, Timestamp};
use quill_durability::{recover, DurabilityMode, Wal, WalRecord};
use quill_storage::StreamStore;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Upper bound on internal conflict retries for one append call.
///
/// A conflict means the key's head moved under a stale computation; each
/// retry recomputes from fresh state. Exhaustion surfaces as
/// [`Error::Unavailable`], never as a raw conflict.
pub const MAX_APPEND_ATTEMPTS: u32 = 5;

/// File name of the write-ahead log inside the data directory.
const WAL_FILE: &str = "wal.qlog";

/// A shared, durable, per-key sequenced message log.
///
/// All operations take `&self`; wrap the database in an `Arc` to share it
/// across threads. Every handle sees one consistent store: an entry returned
/// by [`Database::append`] is visible to [`Database::recent`] immediately.
pub struct Database {
    store: StreamStore,
    wal: Option<Mutex<Wal>>,
    locks: StreamLocks,
    mode: DurabilityMode,
    next_txn_id: AtomicU64,
    data_dir: Option<PathBuf>,
}

impl Database {
    /// Open a database at the given directory with default (batched)
    /// durability. Creates the directory and log file if missing; otherwise
    /// recovers committed state from the log.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder().path(path).open()
    }

    /// Create an ephemeral database: no directory, no WAL, no recovery.
    ///
    /// All data is lost on drop. Meant for tests and caches.
    pub fn ephemeral() -> Result<Self> {
        Ok(Database {
            store: StreamStore::new(),
            wal: None,
            locks: StreamLocks::new(),
            mode: DurabilityMode::None,
            next_txn_id: AtomicU64::new(1),
            data_dir: None,
        })
    }

    /// Start building a database with explicit configuration.
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    // ========================================================================
    // Append path
    // ========================================================================

    /// Append a payload under a key, assigning the next sequence number.
    ///
    /// Returns the committed entry, including its assigned sequence and
    /// commit timestamp.
    ///
    /// # Guarantees
    ///
    /// Under any number of concurrent appenders of the same key, every
    /// successful call commits a distinct, contiguous sequence number, and
    /// acknowledged appends order before appends that start later.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`]: empty or oversized key
    /// - [`Error::Unavailable`]: the commit could not be made durable, or
    ///   conflict retries were exhausted; nothing was applied
    pub fn append(&self, key: &str, payload: impl Into<String>) -> Result<Entry> {
        let key = StreamKey::new(key)?;
        let payload = payload.into();

        let mut last_conflict = None;
        for attempt in 1..=MAX_APPEND_ATTEMPTS {
            match self.try_append(&key, &payload) {
                Ok(entry) => {
                    if attempt > 1 {
                        tracing::debug!(key = %key, attempt, "append succeeded after retry");
                    }
                    return Ok(entry);
                }
                Err(err) if err.is_conflict() => {
                    tracing::warn!(key = %key, attempt, %err, "append conflict, retrying");
                    last_conflict = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        // Bounded retries exhausted; surface as unavailability, not as the
        // raw constraint violation.
        let detail = last_conflict
            .map(|err| err.to_string())
            .unwrap_or_else(|| "conflict".to_string());
        Err(Error::Unavailable(format!(
            "append to '{}' did not commit after {} attempts: {}",
            key, MAX_APPEND_ATTEMPTS, detail
        )))
    }

    /// One append transaction: the critical section described at module level.
    fn try_append(&self, key: &StreamKey, payload: &str) -> Result<Entry> {
        let lock = self.locks.acquire(key);
        let _guard = lock.lock();

        let next = self.store.head(key.as_str()) + 1;
        let entry = Entry::new(key.clone(), payload, next, Timestamp::now());

        if let Some(wal) = &self.wal {
            let txn_id = self.next_txn_id.fetch_add(1, Ordering::SeqCst);
            let mut wal = wal.lock();
            if let Err(err) = Self::write_txn(&mut wal, txn_id, &entry, &self.mode) {
                // The commit record never became durable: the transaction is
                // either absent from the log or orphaned, and recovery will
                // discard it. The sequence number is not consumed.
                return Err(Error::Unavailable(format!(
                    "commit of '{}'/{} failed: {}",
                    key, next, err
                )));
            }
        }

        match self.store.insert(entry.clone()) {
            Ok(()) => {
                tracing::debug!(key = %key, sequence = next, "append committed");
                Ok(entry)
            }
            Err(err) if self.wal.is_some() => {
                // Unreachable under the key lock. If it ever fires, the WAL
                // already holds the committed transaction, so the log stays
                // authoritative and recovery replays it on restart.
                tracing::error!(
                    key = %key,
                    sequence = next,
                    %err,
                    "apply failed after durable commit - will be recovered on restart"
                );
                Ok(entry)
            }
            Err(err) => Err(err),
        }
    }

    /// Write Begin / Append / Commit for one entry and apply the fsync policy.
    fn write_txn(
        wal: &mut Wal,
        txn_id: u64,
        entry: &Entry,
        mode: &DurabilityMode,
    ) -> Result<()> {
        wal.append(&WalRecord::Begin {
            txn_id,
            timestamp: entry.created_at,
        })?;
        wal.append(&WalRecord::Append {
            txn_id,
            key: entry.key.clone(),
            sequence: entry.sequence,
            payload: entry.payload.clone(),
            timestamp: entry.created_at,
        })?;
        wal.append(&WalRecord::Commit { txn_id })?;
        wal.commit(mode)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// The `limit` most recent entries for a key, descending by sequence.
    ///
    /// Re-reads current committed state on every call; an entry returned by
    /// [`Database::append`] is already visible here. An unknown key yields
    /// an empty vec, not an error.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for an invalid key or a zero limit.
    pub fn recent(&self, key: &str, limit: u64) -> Result<Vec<Entry>> {
        let key = StreamKey::new(key)?;
        if limit == 0 {
            return Err(Error::Validation("limit must be positive".to_string()));
        }
        Ok(self.store.recent(key.as_str(), limit as usize))
    }

    /// Highest committed sequence for a key, 0 if the key has none.
    pub fn head(&self, key: &str) -> Result<u64> {
        let key = StreamKey::new(key)?;
        Ok(self.store.head(key.as_str()))
    }

    /// Number of committed entries for a key.
    pub fn len(&self, key: &str) -> Result<u64> {
        self.head(key)
    }

    /// All keys currently holding entries, unordered.
    pub fn streams(&self) -> Vec<StreamKey> {
        self.store.stream_names()
    }

    /// Total committed entries across all keys.
    pub fn total_entries(&self) -> usize {
        self.store.total_entries()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Force any batched WAL writes to disk.
    pub fn flush(&self) -> Result<()> {
        if let Some(wal) = &self.wal {
            wal.lock().sync()?;
        }
        Ok(())
    }

    /// Flush and release the database. Further use of clones is safe but
    /// unsynced writes are no longer buffered.
    pub fn shutdown(&self) -> Result<()> {
        self.flush()
    }

    /// The configured durability mode.
    pub fn durability_mode(&self) -> DurabilityMode {
        self.mode
    }

    /// Directory holding the log, `None` for ephemeral databases.
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Whether this database keeps no durable state.
    pub fn is_ephemeral(&self) -> bool {
        self.wal.is_none()
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Err(err) = self.flush() {
            tracing::warn!(%err, "flush on drop failed");
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("mode", &self.mode)
            .field("data_dir", &self.data_dir)
            .field("total_entries", &self.store.total_entries())
            .finish()
    }
}

/// Builder for database configuration.
///
/// # Example
///
/// ```ignore
/// let db = Database::builder()
///     .path("./messages")
///     .strict()
///     .open()?;
/// ```
#[derive(Debug, Default)]
pub struct DatabaseBuilder {
    path: Option<PathBuf>,
    mode: DurabilityMode,
}

impl DatabaseBuilder {
    /// Create a builder with default settings (batched durability).
    pub fn new() -> Self {
        DatabaseBuilder {
            path: None,
            mode: DurabilityMode::default(),
        }
    }

    /// Set the data directory.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// fsync on every commit (safest, slowest).
    pub fn strict(mut self) -> Self {
        self.mode = DurabilityMode::Strict;
        self
    }

    /// Batched fsync with recommended defaults (the default mode).
    pub fn buffered(mut self) -> Self {
        self.mode = DurabilityMode::buffered_default();
        self
    }

    /// Batched fsync with explicit thresholds.
    pub fn buffered_with(mut self, interval_ms: u64, batch_size: usize) -> Self {
        self.mode = DurabilityMode::Batched {
            interval_ms,
            batch_size,
        };
        self
    }

    /// Disable the WAL entirely. All data is lost on drop.
    pub fn no_durability(mut self) -> Self {
        self.mode = DurabilityMode::None;
        self
    }

    /// Open the database, running recovery when a log already exists.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] when durability is enabled but no path is set
    /// - [`Error::Corruption`] when the log header is invalid or replayed
    ///   entries violate the per-key contiguity invariant
    /// - [`Error::Io`] on filesystem failures
    pub fn open(self) -> Result<Database> {
        if !self.mode.requires_wal() {
            let mut db = Database::ephemeral()?;
            db.data_dir = self.path;
            return Ok(db);
        }

        let path = self.path.ok_or_else(|| {
            Error::Validation("a data directory is required unless durability is disabled".to_string())
        })?;
        std::fs::create_dir_all(&path)?;

        let mut wal = Wal::open(path.join(WAL_FILE))?;
        let (entries, report) = recover(&mut wal)?;
        tracing::info!(store_id = %wal.store_id(), "{}", report.summary());

        let store = StreamStore::new();
        for entry in entries {
            let key = entry.key.clone();
            let sequence = entry.sequence;
            store.insert(entry).map_err(|err| {
                Error::Corruption(format!(
                    "log replay violates contiguity at '{}'/{}: {}",
                    key, sequence, err
                ))
            })?;
        }

        Ok(Database {
            store,
            wal: Some(Mutex::new(wal)),
            locks: StreamLocks::new(),
            mode: self.mode,
            next_txn_id: AtomicU64::new(report.max_txn_id + 1),
            data_dir: Some(path),
        })
    }
}
