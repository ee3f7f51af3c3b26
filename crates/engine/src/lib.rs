//! Engine for the quill message log
//!
//! Ties storage and durability together behind [`Database`]:
//! - open/recovery, flush and shutdown
//! - the append path: per-key locking, sequence allocation, WAL commit,
//!   bounded conflict retry
//! - reads: recent window, head, length, stream listing

pub mod database;
pub mod locks;

pub use database::{Database, DatabaseBuilder, MAX_APPEND_ATTEMPTS};
pub use locks::StreamLocks;
pub use quill_durability::DurabilityMode;
