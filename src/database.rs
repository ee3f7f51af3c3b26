//! Main database entry point.
//!
//! This module provides the `Quill` struct, the primary entry point for all
//! message-log operations.

use crate::messages::Messages;
use crate::{MessageService, Result};
use std::path::Path;
use std::sync::Arc;

/// The Quill database.
///
/// Create one with [`Quill::open`], [`Quill::ephemeral`] or
/// [`Quill::builder`], then operate through the [`Messages`] facade.
///
/// # Example
///
/// ```ignore
/// use quilldb::prelude::*;
///
/// let db = Quill::open("./messages")?;
/// db.messages.submit("alice", "hi")?;
/// db.close()?;
/// ```
pub struct Quill {
    /// The underlying engine database
    inner: Arc<quill_engine::Database>,

    /// Message operations
    pub messages: Messages,
}

impl Quill {
    /// Open a database at the given directory.
    ///
    /// Uses default settings (batched durability). Recovers committed state
    /// from the log when one exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder().path(path).open()
    }

    /// Create an ephemeral database with no disk I/O.
    ///
    /// No files, no WAL, no recovery; all data is lost on drop. Use for
    /// unit tests and temporary computations.
    pub fn ephemeral() -> Result<Self> {
        Ok(Self::from_engine(Arc::new(quill_engine::Database::ephemeral()?)))
    }

    /// Create a builder for explicit configuration.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let db = Quill::builder()
    ///     .path("./messages")
    ///     .strict()
    ///     .open()?;
    /// ```
    pub fn builder() -> QuillBuilder {
        QuillBuilder::new()
    }

    /// Wire-facing service over this database, for a transport layer.
    pub fn service(&self) -> MessageService {
        MessageService::new(self.inner.clone())
    }

    /// Force any batched WAL writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.inner.flush()
    }

    /// Gracefully close the database: flush pending writes.
    ///
    /// Clones of the handle remain usable; this exists for explicit
    /// shutdown at the end of a process.
    pub fn close(&self) -> Result<()> {
        self.inner.shutdown()
    }

    /// The configured durability mode.
    pub fn durability_mode(&self) -> crate::DurabilityMode {
        self.inner.durability_mode()
    }

    /// The data directory, `None` for ephemeral databases.
    pub fn path(&self) -> Option<&Path> {
        self.inner.data_dir()
    }

    /// Whether this database keeps no durable state.
    pub fn is_ephemeral(&self) -> bool {
        self.inner.is_ephemeral()
    }

    fn from_engine(db: Arc<quill_engine::Database>) -> Self {
        Quill {
            messages: Messages::new(db.clone()),
            inner: db,
        }
    }
}

impl std::fmt::Debug for Quill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Quill").field("inner", &self.inner).finish()
    }
}

/// Builder for database configuration.
///
/// # Example
///
/// ```ignore
/// // Production: batched durability (default)
/// let db = Quill::builder().path("./messages").open()?;
///
/// // Audit-grade: fsync every commit
/// let db = Quill::builder().path("./messages").strict().open()?;
///
/// // Unit testing: no disk at all
/// let db = Quill::ephemeral()?;
/// ```
#[derive(Debug, Default)]
pub struct QuillBuilder {
    inner: quill_engine::DatabaseBuilder,
}

impl QuillBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        QuillBuilder {
            inner: quill_engine::DatabaseBuilder::new(),
        }
    }

    /// Set the data directory.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.inner = self.inner.path(path);
        self
    }

    /// fsync on every commit (safest, slowest).
    pub fn strict(mut self) -> Self {
        self.inner = self.inner.strict();
        self
    }

    /// Batched fsync with recommended defaults (the default mode).
    pub fn buffered(mut self) -> Self {
        self.inner = self.inner.buffered();
        self
    }

    /// Batched fsync with explicit thresholds.
    pub fn buffered_with(mut self, interval_ms: u64, batch_size: usize) -> Self {
        self.inner = self.inner.buffered_with(interval_ms, batch_size);
        self
    }

    /// Disable the WAL entirely. All data is lost on drop.
    pub fn no_durability(mut self) -> Self {
        self.inner = self.inner.no_durability();
        self
    }

    /// Open the database.
    pub fn open(self) -> Result<Quill> {
        Ok(Quill::from_engine(Arc::new(self.inner.open()?)))
    }
}
