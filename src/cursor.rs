//! Per-query scratch state.
//!
//! A [`QueryCursor`] owns the query bytes and the last result of a lookup or
//! reverse lookup, so repeated queries against a [`crate::Trie`] allocate
//! nothing once the buffers have grown. One cursor drives one in-flight
//! query; concurrent readers each bring their own.

use thiserror::Error;

use crate::keyset::MAX_KEY_LEN;
use crate::trie::KeyId;

/// Errors raised by cursor operations.
#[derive(Debug, Error)]
pub enum CursorError {
    /// Query exceeds [`MAX_KEY_LEN`]; no stored key can match it.
    #[error("query of {len} bytes exceeds the {max} byte key limit")]
    QueryTooLong {
        /// Length of the rejected query.
        len: usize,
        /// The enforced maximum.
        max: usize,
    },

    /// Caller-provided buffer cannot hold the matched key.
    #[error("buffer of {capacity} bytes cannot hold a {needed} byte key")]
    BufferTooSmall {
        /// Bytes required for the matched key.
        needed: usize,
        /// Capacity of the buffer supplied.
        capacity: usize,
    },

    /// No hit has been recorded since the last [`QueryCursor::set_query`].
    #[error("cursor holds no matched key")]
    NoMatch,
}

/// Reusable mutable scratch for lookups and reverse lookups.
#[derive(Debug, Clone, Default)]
pub struct QueryCursor {
    query: Vec<u8>,
    matched_key: Vec<u8>,
    matched_id: Option<KeyId>,
}

impl QueryCursor {
    /// Create a cursor with empty buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the cursor to begin a fresh lookup for `key`.
    ///
    /// Clears any previously recorded match. O(1) beyond copying the bytes
    /// into the cursor's reused buffer.
    pub fn set_query(&mut self, key: &[u8]) -> Result<(), CursorError> {
        if key.len() > MAX_KEY_LEN {
            return Err(CursorError::QueryTooLong {
                len: key.len(),
                max: MAX_KEY_LEN,
            });
        }
        self.query.clear();
        self.query.extend_from_slice(key);
        self.matched_id = None;
        self.matched_key.clear();
        Ok(())
    }

    /// The current query bytes.
    pub fn query(&self) -> &[u8] {
        &self.query
    }

    /// Id recorded by the last successful lookup or reverse lookup.
    pub fn matched_id(&self) -> Option<KeyId> {
        self.matched_id
    }

    /// Key bytes recorded by the last successful lookup or reverse lookup.
    pub fn matched_key(&self) -> Option<&[u8]> {
        self.matched_id.is_some().then(|| self.matched_key.as_slice())
    }

    /// Copy the last matched key into `buffer`, returning its length.
    ///
    /// Fails with [`CursorError::BufferTooSmall`] without touching the
    /// buffer when it cannot hold the whole key; there is no partial write
    /// and no terminator byte.
    pub fn current_key(&self, buffer: &mut [u8]) -> Result<usize, CursorError> {
        if self.matched_id.is_none() {
            return Err(CursorError::NoMatch);
        }
        let needed = self.matched_key.len();
        if buffer.len() < needed {
            return Err(CursorError::BufferTooSmall {
                needed,
                capacity: buffer.len(),
            });
        }
        buffer[..needed].copy_from_slice(&self.matched_key);
        Ok(needed)
    }

    /// Record a lookup hit: the query itself is the matched key.
    pub(crate) fn record_hit(&mut self, id: KeyId) {
        self.matched_id = Some(id);
        let Self {
            query, matched_key, ..
        } = self;
        matched_key.clear();
        matched_key.extend_from_slice(query);
    }

    /// Record a lookup miss.
    pub(crate) fn record_miss(&mut self) {
        self.matched_id = None;
        self.matched_key.clear();
    }

    /// Buffer a reverse lookup writes the reconstructed key into.
    pub(crate) fn key_buf_mut(&mut self) -> &mut Vec<u8> {
        &mut self.matched_key
    }

    /// Record a reverse-lookup hit after the key bytes are in place.
    pub(crate) fn record_reverse_hit(&mut self, id: KeyId) {
        self.matched_id = Some(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_query_clears_previous_match() {
        let mut cursor = QueryCursor::new();
        cursor.set_query(b"first").unwrap();
        cursor.record_hit(7);
        assert_eq!(cursor.matched_id(), Some(7));

        cursor.set_query(b"second").unwrap();
        assert_eq!(cursor.matched_id(), None);
        assert_eq!(cursor.matched_key(), None);
        assert!(matches!(
            cursor.current_key(&mut [0; 16]),
            Err(CursorError::NoMatch)
        ));
    }

    #[test]
    fn set_query_rejects_oversized_query() {
        let mut cursor = QueryCursor::new();
        let long = vec![0u8; MAX_KEY_LEN + 1];
        assert!(matches!(
            cursor.set_query(&long),
            Err(CursorError::QueryTooLong { .. })
        ));
    }

    #[test]
    fn current_key_guards_short_buffers_without_partial_writes() {
        let mut cursor = QueryCursor::new();
        cursor.set_query(b"carpet").unwrap();
        cursor.record_hit(0);

        let mut short = [0xAAu8; 3];
        assert!(matches!(
            cursor.current_key(&mut short),
            Err(CursorError::BufferTooSmall {
                needed: 6,
                capacity: 3
            })
        ));
        assert_eq!(short, [0xAA; 3], "failed copy must not touch the buffer");

        let mut exact = [0u8; 6];
        assert_eq!(cursor.current_key(&mut exact).unwrap(), 6);
        assert_eq!(&exact, b"carpet");
    }
}
