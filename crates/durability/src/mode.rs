//! Durability mode for WAL operations.
//!
//! Controls when data is fsynced to disk and the trade-off between
//! performance and durability.

/// Durability mode for WAL writes.
///
/// # Mode Comparison
///
/// | Mode | Use Case |
/// |------|----------|
/// | None | Tests, ephemeral databases |
/// | Batched | Production (balanced) |
/// | Strict | Audit-grade logs, zero committed-data loss |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurabilityMode {
    /// No durability - all data lost on crash.
    ///
    /// Bypasses the WAL entirely. No fsync, no file I/O.
    None,

    /// fsync after every commit (slow, maximum durability).
    ///
    /// Use when losing even a single acknowledged append is unacceptable.
    Strict,

    /// fsync every N commits OR every T milliseconds, checked at commit time.
    ///
    /// May lose up to `batch_size` appends or `interval_ms` of data on
    /// crash - always whole transactions, never partial ones.
    Batched {
        /// Maximum time between fsyncs in milliseconds
        interval_ms: u64,
        /// Maximum commits between fsyncs
        batch_size: usize,
    },
}

impl DurabilityMode {
    /// Check if this mode requires WAL persistence.
    pub fn requires_wal(&self) -> bool {
        !matches!(self, DurabilityMode::None)
    }

    /// Check if this mode requires fsync on every commit.
    pub fn requires_immediate_fsync(&self) -> bool {
        matches!(self, DurabilityMode::Strict)
    }

    /// Human-readable description of the mode.
    pub fn description(&self) -> &'static str {
        match self {
            DurabilityMode::None => "No durability (fastest, all data lost on crash)",
            DurabilityMode::Strict => "Sync fsync (safest, slowest)",
            DurabilityMode::Batched { .. } => "Batched fsync (balanced speed/safety)",
        }
    }

    /// Create a buffered mode with recommended defaults.
    ///
    /// Returns `Batched { interval_ms: 100, batch_size: 1000 }`.
    pub fn buffered_default() -> Self {
        DurabilityMode::Batched {
            interval_ms: 100,
            batch_size: 1000,
        }
    }
}

impl Default for DurabilityMode {
    fn default() -> Self {
        Self::buffered_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_mode() {
        let mode = DurabilityMode::None;
        assert!(!mode.requires_wal());
        assert!(!mode.requires_immediate_fsync());
    }

    #[test]
    fn test_strict_mode() {
        let mode = DurabilityMode::Strict;
        assert!(mode.requires_wal());
        assert!(mode.requires_immediate_fsync());
    }

    #[test]
    fn test_batched_mode() {
        let mode = DurabilityMode::Batched {
            interval_ms: 100,
            batch_size: 1000,
        };
        assert!(mode.requires_wal());
        assert!(!mode.requires_immediate_fsync());
    }

    #[test]
    fn test_default_is_batched() {
        match DurabilityMode::default() {
            DurabilityMode::Batched {
                interval_ms,
                batch_size,
            } => {
                assert_eq!(interval_ms, 100);
                assert_eq!(batch_size, 1000);
            }
            other => panic!("expected Batched, got {:?}", other),
        }
    }
}
