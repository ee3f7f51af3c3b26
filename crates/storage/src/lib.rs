//! Storage layer for the quill message log
//!
//! This crate implements the shared in-memory store:
//! - StreamStore: per-key shards in a DashMap, no cross-key contention
//! - The `(key, sequence)` uniqueness/contiguity constraint at insert
//! - Read operations: recent window, full scan, head, length

#![warn(missing_docs)]

pub mod store;

pub use store::StreamStore;
