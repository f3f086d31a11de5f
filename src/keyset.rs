//! Key batch accumulation ahead of a dictionary build.
//!
//! A [`KeyBatch`] is write-only: keys are appended, never queried, and the
//! whole batch is consumed exactly once by [`crate::Trie::build`]. Keeping
//! ingestion decoupled from trie updates lets very large batches stream in
//! at amortized O(1) per key.

use thiserror::Error;

/// Maximum accepted key length in bytes.
///
/// Downstream encodings are length-prefixed, so the bound must be explicit;
/// it matches a 16-bit length field.
pub const MAX_KEY_LEN: usize = u16::MAX as usize;

/// Errors raised while appending keys to a batch.
#[derive(Debug, Error)]
pub enum PushError {
    /// Key exceeds [`MAX_KEY_LEN`].
    #[error("key of {len} bytes exceeds the {max} byte limit")]
    KeyTooLong {
        /// Length of the rejected key.
        len: usize,
        /// The enforced maximum.
        max: usize,
    },

    /// The allocator refused to grow the batch.
    #[error("out of memory while appending a {len} byte key")]
    OutOfMemory {
        /// Length of the key being appended.
        len: usize,
    },
}

/// Append-only collection of keys awaiting a single build.
///
/// Duplicate keys are accepted here; deduplication is a build-time policy
/// (duplicates collapse to one entry, see [`crate::Trie::build`]). The empty
/// key is a valid key.
#[derive(Debug, Clone, Default)]
pub struct KeyBatch {
    keys: Vec<Vec<u8>>,
    total_bytes: usize,
}

impl KeyBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a copy of `key` to the batch.
    ///
    /// Ingestion is the one unbounded caller-driven allocation path, so
    /// exhaustion is reported as [`PushError::OutOfMemory`] rather than
    /// aborting the process.
    pub fn push(&mut self, key: &[u8]) -> Result<(), PushError> {
        if key.len() > MAX_KEY_LEN {
            return Err(PushError::KeyTooLong {
                len: key.len(),
                max: MAX_KEY_LEN,
            });
        }
        self.keys
            .try_reserve(1)
            .map_err(|_| PushError::OutOfMemory { len: key.len() })?;
        let mut owned = Vec::new();
        owned
            .try_reserve_exact(key.len())
            .map_err(|_| PushError::OutOfMemory { len: key.len() })?;
        owned.extend_from_slice(key);
        self.keys.push(owned);
        self.total_bytes += key.len();
        Ok(())
    }

    /// Number of keys appended so far (duplicates included).
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the batch holds no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Total bytes across all appended keys.
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Surrender the accumulated keys to the builder.
    pub(crate) fn into_keys(self) -> Vec<Vec<u8>> {
        self.keys
    }
}
