//! Durability layer for the quill message log
//!
//! Write-ahead logging and crash recovery:
//! - [`WalRecord`]: the record types written per append transaction
//! - [`Wal`]: the framed, checksummed segment file
//! - [`recover`]: replay that applies only committed transactions
//! - [`DurabilityMode`]: fsync policy (None / Strict / Batched)
//!
//! The commit record is the durability point: an append transaction whose
//! `Commit` never reached the log is discarded on recovery and consumes no
//! sequence number.

pub mod log;
pub mod mode;
pub mod record;
pub mod recovery;

pub use log::{Wal, SEGMENT_FORMAT_VERSION, SEGMENT_HEADER_SIZE, SEGMENT_MAGIC};
pub use mode::DurabilityMode;
pub use record::WalRecord;
pub use recovery::{recover, RecoveryReport};
