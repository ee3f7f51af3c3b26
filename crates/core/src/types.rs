//! Key and timestamp types
//!
//! [`StreamKey`] identifies the owner of a private, monotonic sequence space
//! (e.g. a username). Keys are validated at construction so the rest of the
//! system never sees an empty or oversized key.
//!
//! [`Timestamp`] is commit-time metadata. Two entries for the same key may
//! carry equal timestamps; ordering authority is always the sequence number.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// Maximum accepted key length in bytes.
pub const MAX_KEY_LEN: usize = 128;

/// Validated owner of a private sequence space.
///
/// A `StreamKey` namespaces one append-only log: sequence numbers are unique
/// and contiguous *within* a key, and independent *across* keys.
///
/// # Examples
///
/// ```
/// use quill_core::StreamKey;
///
/// let key = StreamKey::new("alice").unwrap();
/// assert_eq!(key.as_str(), "alice");
/// assert!(StreamKey::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamKey(String);

impl StreamKey {
    /// Create a validated key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the key is empty or longer than
    /// [`MAX_KEY_LEN`] bytes.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::Validation("key must not be empty".to_string()));
        }
        if key.len() > MAX_KEY_LEN {
            return Err(Error::Validation(format!(
                "key exceeds {} bytes: {} bytes",
                MAX_KEY_LEN,
                key.len()
            )));
        }
        Ok(StreamKey(key))
    }

    /// View the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the key, returning the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for StreamKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Borrow<str> lets map lookups use &str without cloning the key.
// Sound because the derived Hash/Eq delegate to the inner String.
impl Borrow<str> for StreamKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StreamKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Milliseconds since the Unix epoch.
///
/// Assigned by the engine at commit time. Monotonically non-decreasing per
/// key in practice, but ties are allowed and carry no meaning: consumers must
/// order by sequence number, never by timestamp.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Current wall-clock time.
    pub fn now() -> Self {
        Timestamp(chrono::Utc::now().timestamp_millis())
    }

    /// Construct from raw milliseconds.
    pub fn from_millis(millis: i64) -> Self {
        Timestamp(millis)
    }

    /// Raw milliseconds since epoch.
    pub fn as_millis(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
