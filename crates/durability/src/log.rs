//! The write-ahead log segment file
//!
//! Single append-only file with a fixed header and checksummed frames:
//!
//! ```text
//! header:  magic "QLOG" | format version u32 LE | store id (16 bytes)
//! frame:   len u32 LE | crc32 u32 LE | bincode(WalRecord)
//! ```
//!
//! Replay validates every frame. A frame that is short, oversized, or fails
//! its checksum is treated as a torn tail from a crash mid-write: replay
//! stops there, the file is truncated back to the last good frame, and the
//! event is reported - never surfaced as an error. A bad *header* is real
//! corruption and does fail the open.

use crate::mode::DurabilityMode;
use crate::record::WalRecord;
use byteorder::{ByteOrder, LittleEndian};
use quill_core::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

/// Magic bytes opening every segment file.
pub const SEGMENT_MAGIC: &[u8; 4] = b"QLOG";

/// Current segment format version.
pub const SEGMENT_FORMAT_VERSION: u32 = 1;

/// Header size: magic + version + store id.
pub const SEGMENT_HEADER_SIZE: u64 = 24;

// Frames larger than this are assumed to be garbage lengths from a torn
// write, not real records.
const MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

/// Outcome of replaying a segment file.
#[derive(Debug)]
pub struct Replay {
    /// Records recovered, in file order.
    pub records: Vec<WalRecord>,
    /// Whether a torn tail was truncated away.
    pub truncated_tail: bool,
}

/// An open write-ahead log segment.
pub struct Wal {
    file: File,
    path: PathBuf,
    store_id: Uuid,
    pending_commits: usize,
    last_sync: Instant,
}

impl Wal {
    /// Open a segment file, creating it (with a fresh store id) if missing.
    ///
    /// # Errors
    ///
    /// [`Error::Corruption`] when an existing file has the wrong magic or an
    /// unsupported format version; [`Error::Io`] on filesystem failures.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        let len = file.metadata()?.len();
        let store_id = if len == 0 {
            let store_id = Uuid::new_v4();
            let mut header = [0u8; SEGMENT_HEADER_SIZE as usize];
            header[..4].copy_from_slice(SEGMENT_MAGIC);
            LittleEndian::write_u32(&mut header[4..8], SEGMENT_FORMAT_VERSION);
            header[8..24].copy_from_slice(store_id.as_bytes());
            file.write_all(&header)?;
            file.sync_data()?;
            store_id
        } else {
            if len < SEGMENT_HEADER_SIZE {
                return Err(Error::Corruption(format!(
                    "segment '{}' shorter than its header",
                    path.display()
                )));
            }
            let mut header = [0u8; SEGMENT_HEADER_SIZE as usize];
            file.seek(SeekFrom::Start(0))?;
            file.read_exact(&mut header)?;
            if &header[..4] != SEGMENT_MAGIC {
                return Err(Error::Corruption(format!(
                    "segment '{}' has bad magic",
                    path.display()
                )));
            }
            let version = LittleEndian::read_u32(&header[4..8]);
            if version != SEGMENT_FORMAT_VERSION {
                return Err(Error::Corruption(format!(
                    "segment '{}' has unsupported format version {}",
                    path.display(),
                    version
                )));
            }
            let mut id_bytes = [0u8; 16];
            id_bytes.copy_from_slice(&header[8..24]);
            Uuid::from_bytes(id_bytes)
        };

        Ok(Wal {
            file,
            path,
            store_id,
            pending_commits: 0,
            last_sync: Instant::now(),
        })
    }

    /// Identity written into the header when the segment was created.
    pub fn store_id(&self) -> Uuid {
        self.store_id
    }

    /// Path of the segment file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every valid frame from the start of the file.
    ///
    /// Truncates a torn tail in place so subsequent appends continue from
    /// the last good frame.
    pub fn replay(&mut self) -> Result<Replay> {
        let file_len = self.file.metadata()?.len();
        self.file.seek(SeekFrom::Start(SEGMENT_HEADER_SIZE))?;

        let mut records = Vec::new();
        let mut good_offset = SEGMENT_HEADER_SIZE;
        let mut truncated_tail = false;

        loop {
            if good_offset == file_len {
                break;
            }
            match self.read_frame(good_offset, file_len)? {
                Some((record, next_offset)) => {
                    records.push(record);
                    good_offset = next_offset;
                }
                None => {
                    tracing::warn!(
                        path = %self.path.display(),
                        offset = good_offset,
                        "torn tail in segment, truncating"
                    );
                    self.file.set_len(good_offset)?;
                    self.file.sync_data()?;
                    truncated_tail = true;
                    break;
                }
            }
        }

        self.file.seek(SeekFrom::End(0))?;
        Ok(Replay {
            records,
            truncated_tail,
        })
    }

    /// Read one frame at `offset`. `Ok(None)` means a torn tail.
    fn read_frame(&mut self, offset: u64, file_len: u64) -> Result<Option<(WalRecord, u64)>> {
        if file_len - offset < 8 {
            return Ok(None);
        }
        let mut prefix = [0u8; 8];
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(&mut prefix)?;
        let len = LittleEndian::read_u32(&prefix[..4]);
        let expected_crc = LittleEndian::read_u32(&prefix[4..8]);

        if len == 0 || len > MAX_FRAME_LEN || file_len - offset - 8 < len as u64 {
            return Ok(None);
        }
        let mut payload = vec![0u8; len as usize];
        self.file.read_exact(&mut payload)?;
        if crc32fast::hash(&payload) != expected_crc {
            return Ok(None);
        }
        let record: WalRecord = match bincode::deserialize(&payload) {
            Ok(record) => record,
            // CRC-valid bytes that fail to decode were written by something
            // else; that is corruption, not a torn write.
            Err(e) => {
                return Err(Error::Corruption(format!(
                    "undecodable frame at offset {}: {}",
                    offset, e
                )))
            }
        };
        Ok(Some((record, offset + 8 + len as u64)))
    }

    /// Append one record frame at the end of the file. Does not fsync.
    pub fn append(&mut self, record: &WalRecord) -> Result<()> {
        let payload =
            bincode::serialize(record).map_err(|e| Error::Serialization(e.to_string()))?;
        if payload.len() as u64 > MAX_FRAME_LEN as u64 {
            return Err(Error::Serialization(format!(
                "record of {} bytes exceeds frame limit",
                payload.len()
            )));
        }

        let mut frame = Vec::with_capacity(8 + payload.len());
        let mut prefix = [0u8; 8];
        LittleEndian::write_u32(&mut prefix[..4], payload.len() as u32);
        LittleEndian::write_u32(&mut prefix[4..8], crc32fast::hash(&payload));
        frame.extend_from_slice(&prefix);
        frame.extend_from_slice(&payload);

        self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(&frame)?;
        Ok(())
    }

    /// Apply the mode's fsync policy after a commit record was appended.
    pub fn commit(&mut self, mode: &DurabilityMode) -> Result<()> {
        match mode {
            DurabilityMode::None => Ok(()),
            DurabilityMode::Strict => self.sync(),
            DurabilityMode::Batched {
                interval_ms,
                batch_size,
            } => {
                self.pending_commits += 1;
                if self.pending_commits >= *batch_size
                    || self.last_sync.elapsed().as_millis() >= *interval_ms as u128
                {
                    self.sync()
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Force an fsync of everything appended so far.
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        self.pending_commits = 0;
        self.last_sync = Instant::now();
        Ok(())
    }
}

impl std::fmt::Debug for Wal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wal")
            .field("path", &self.path)
            .field("store_id", &self.store_id)
            .field("pending_commits", &self.pending_commits)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::{StreamKey, Timestamp};
    use tempfile::TempDir;

    fn record(txn_id: u64, seq: u64) -> WalRecord {
        WalRecord::Append {
            txn_id,
            key: StreamKey::new("alice").unwrap(),
            sequence: seq,
            payload: format!("payload {}", seq),
            timestamp: Timestamp::from_millis(1_700_000_000_000),
        }
    }

    #[test]
    fn test_open_creates_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.qlog");
        let wal = Wal::open(&path).unwrap();
        drop(wal);

        let len = std::fs::metadata(&path).unwrap().len();
        assert_eq!(len, SEGMENT_HEADER_SIZE);
    }

    #[test]
    fn test_store_id_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.qlog");

        let first = Wal::open(&path).unwrap().store_id();
        let second = Wal::open(&path).unwrap().store_id();
        assert_eq!(first, second);
    }

    #[test]
    fn test_append_and_replay() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.qlog");

        {
            let mut wal = Wal::open(&path).unwrap();
            for i in 0..5 {
                wal.append(&record(i, i + 1)).unwrap();
            }
            wal.sync().unwrap();
        }

        let mut wal = Wal::open(&path).unwrap();
        let replay = wal.replay().unwrap();
        assert_eq!(replay.records.len(), 5);
        assert!(!replay.truncated_tail);
        assert_eq!(replay.records[2], record(2, 3));
    }

    #[test]
    fn test_append_after_replay_continues_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.qlog");

        {
            let mut wal = Wal::open(&path).unwrap();
            wal.append(&record(1, 1)).unwrap();
            wal.sync().unwrap();
        }
        {
            let mut wal = Wal::open(&path).unwrap();
            assert_eq!(wal.replay().unwrap().records.len(), 1);
            wal.append(&record(2, 2)).unwrap();
            wal.sync().unwrap();
        }

        let mut wal = Wal::open(&path).unwrap();
        assert_eq!(wal.replay().unwrap().records.len(), 2);
    }

    #[test]
    fn test_torn_tail_is_truncated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.qlog");

        {
            let mut wal = Wal::open(&path).unwrap();
            wal.append(&record(1, 1)).unwrap();
            wal.append(&record(2, 2)).unwrap();
            wal.sync().unwrap();
        }

        // Simulate a crash mid-write: garbage where a frame should start.
        {
            use std::io::Write;
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(&[0xDE, 0xAD, 0xBE]).unwrap();
        }

        let mut wal = Wal::open(&path).unwrap();
        let replay = wal.replay().unwrap();
        assert_eq!(replay.records.len(), 2);
        assert!(replay.truncated_tail);

        // The tail is gone; a fresh replay sees a clean file.
        let mut wal = Wal::open(&path).unwrap();
        let replay = wal.replay().unwrap();
        assert_eq!(replay.records.len(), 2);
        assert!(!replay.truncated_tail);
    }

    #[test]
    fn test_corrupt_frame_checksum_truncates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.qlog");

        {
            let mut wal = Wal::open(&path).unwrap();
            wal.append(&record(1, 1)).unwrap();
            wal.sync().unwrap();
        }

        // Flip a payload byte in the only frame.
        {
            use std::io::{Seek, SeekFrom, Write};
            let mut file = OpenOptions::new().write(true).open(&path).unwrap();
            file.seek(SeekFrom::Start(SEGMENT_HEADER_SIZE + 10)).unwrap();
            file.write_all(&[0xFF]).unwrap();
        }

        let mut wal = Wal::open(&path).unwrap();
        let replay = wal.replay().unwrap();
        assert!(replay.records.is_empty());
        assert!(replay.truncated_tail);
    }

    #[test]
    fn test_bad_magic_is_corruption() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.qlog");
        std::fs::write(&path, b"NOTAQUILLSEGMENTFILE....").unwrap();

        let err = Wal::open(&path).unwrap_err();
        assert!(matches!(err, Error::Corruption(_)));
    }

    #[test]
    fn test_strict_commit_syncs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.qlog");

        let mut wal = Wal::open(&path).unwrap();
        wal.append(&record(1, 1)).unwrap();
        wal.commit(&DurabilityMode::Strict).unwrap();
        assert_eq!(wal.pending_commits, 0);
    }

    #[test]
    fn test_batched_commit_defers_sync() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.qlog");

        let mut wal = Wal::open(&path).unwrap();
        let mode = DurabilityMode::Batched {
            interval_ms: 60_000,
            batch_size: 100,
        };
        for i in 0..10 {
            wal.append(&record(i, i + 1)).unwrap();
            wal.commit(&mode).unwrap();
        }
        assert_eq!(wal.pending_commits, 10);

        wal.append(&record(10, 11)).unwrap();
        wal.commit(&DurabilityMode::Batched {
            interval_ms: 60_000,
            batch_size: 11,
        })
        .unwrap();
        assert_eq!(wal.pending_commits, 0);
    }
}
