//! Immutable compressed trie with dense key ids.
//!
//! The trie is the result of a single [`Trie::build`] over a
//! [`crate::KeyBatch`]. Tree shape is held in a LOUDS bit sequence (per node
//! in level order: one set bit per child, then a clear bit), so navigation
//! is rank/select arithmetic instead of pointer chasing. Edge labels live in
//! one flat array aligned with level order, key-terminal and tail-link flags
//! in two more bit sequences, and folded suffixes in a shared tail pool.
//!
//! Ids are assigned by the position of each key's terminal node in level
//! order, computed from the lexicographically sorted, deduplicated key set.
//! The assignment is a pure function of the key set: push order never
//! matters, rebuilds reproduce it bit for bit, and save/load preserves it.

mod builder;
mod tails;

pub use builder::BuildError;

use thiserror::Error;

use crate::bits::RankedBits;
use crate::cursor::QueryCursor;
pub(crate) use tails::TailStore;

/// Dense key identifier in `[0, num_keys)`.
pub type KeyId = u32;

/// Errors raised by reverse lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The id is outside `[0, num_keys)`.
    #[error("id {id} is out of range for a dictionary of {num_keys} keys")]
    IdOutOfRange {
        /// The rejected id.
        id: KeyId,
        /// Number of keys in the dictionary.
        num_keys: u32,
    },
}

/// Immutable static dictionary over a fixed set of byte keys.
///
/// Safe to share across any number of concurrent readers; each in-flight
/// query needs its own [`QueryCursor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trie {
    /// LOUDS degree bits, level order.
    pub(crate) louds: RankedBits,
    /// Per-node flag: a key ends at this node (after its tail, if any).
    pub(crate) terminal: RankedBits,
    /// Per-node flag: the node carries a folded suffix in the tail pool.
    pub(crate) link: RankedBits,
    /// Edge label of node `n` at `labels[n - 1]`, level order.
    pub(crate) labels: Vec<u8>,
    pub(crate) tails: TailStore,
    pub(crate) num_keys: u32,
}

impl Trie {
    /// Number of distinct keys in the dictionary.
    pub fn num_keys(&self) -> u32 {
        self.num_keys
    }

    /// Number of trie nodes after tail compression.
    pub fn num_nodes(&self) -> usize {
        self.terminal.len()
    }

    /// Size of the shared tail pool in bytes.
    pub fn tail_bytes(&self) -> usize {
        self.tails.pool_len()
    }

    /// Exact-match lookup of the cursor's query.
    ///
    /// Consumes query bytes one edge at a time (binary search over the
    /// node's sorted label run); inside a tail-compressed region the
    /// remaining query bytes are compared against the stored suffix in one
    /// shot. A miss is a normal outcome, reported as `None`, never logged.
    /// On a hit the cursor records the id and matched key for
    /// [`QueryCursor::current_key`].
    pub fn lookup(&self, cursor: &mut QueryCursor) -> Option<KeyId> {
        match self.find(cursor.query()) {
            Some(id) => {
                cursor.record_hit(id);
                Some(id)
            }
            None => {
                cursor.record_miss();
                None
            }
        }
    }

    /// Reconstruct the key assigned to `id`, writing it into the cursor.
    ///
    /// Walks parent links from the terminal node back to the root, then
    /// appends the node's tail. Retrieve the bytes with
    /// [`QueryCursor::current_key`] or [`QueryCursor::matched_key`].
    pub fn reverse_lookup(&self, id: KeyId, cursor: &mut QueryCursor) -> Result<(), LookupError> {
        let out_of_range = LookupError::IdOutOfRange {
            id,
            num_keys: self.num_keys,
        };
        if id >= self.num_keys {
            return Err(out_of_range);
        }
        // One terminal bit per key; in-range ids always select a node.
        let node = self.terminal.select1(id as usize).ok_or(out_of_range)?;

        let buf = cursor.key_buf_mut();
        buf.clear();
        let mut walk = node;
        while walk != 0 {
            buf.push(self.labels[walk - 1]);
            walk = self.parent(walk);
        }
        buf.reverse();
        if self.link.get(node) {
            let tail = self.tails.get(self.link.rank1(node));
            buf.extend_from_slice(tail);
        }
        cursor.record_reverse_hit(id);
        Ok(())
    }

    /// Core traversal shared by [`Trie::lookup`].
    fn find(&self, query: &[u8]) -> Option<KeyId> {
        let mut node = 0usize;
        let mut depth = 0usize;
        loop {
            if self.link.get(node) {
                let tail = self.tails.get(self.link.rank1(node));
                return (&query[depth..] == tail).then(|| self.key_id(node));
            }
            if depth == query.len() {
                return self.terminal.get(node).then(|| self.key_id(node));
            }
            let (first_child, degree) = self.children(node);
            if degree == 0 {
                return None;
            }
            let run = &self.labels[first_child - 1..first_child - 1 + degree];
            match run.binary_search(&query[depth]) {
                Ok(offset) => node = first_child + offset,
                Err(_) => return None,
            }
            depth += 1;
        }
    }

    /// Id of the key terminating at `node`: its terminal rank in level order.
    #[inline]
    fn key_id(&self, node: usize) -> KeyId {
        self.terminal.rank1(node) as KeyId
    }

    /// First child node index and degree of `node`.
    ///
    /// Node `n`'s degree run ends at the `n`-th clear bit; the set bits in
    /// the run are its children, numbered consecutively in level order.
    fn children(&self, node: usize) -> (usize, usize) {
        let run_start = if node == 0 {
            0
        } else {
            match self.louds.select0(node - 1) {
                Some(pos) => pos + 1,
                None => return (0, 0),
            }
        };
        let run_end = match self.louds.select0(node) {
            Some(pos) => pos,
            None => return (0, 0),
        };
        (self.louds.rank1(run_start) + 1, run_end - run_start)
    }

    /// Parent of a non-root node: the count of degree runs closed before the
    /// node's own edge bit.
    #[inline]
    fn parent(&self, node: usize) -> usize {
        match self.louds.select1(node - 1) {
            Some(pos) => self.louds.rank0(pos),
            None => 0,
        }
    }
}

/// Whether a degree bit sequence describes a well-formed level-order tree.
///
/// Walking left to right, each set bit creates the next node as a child of
/// the node whose degree run is currently open, and each clear bit closes
/// that run. The open run must belong to a node that already exists;
/// otherwise parent arithmetic escapes the tree. Matching popcounts alone do
/// not guarantee this, so the codec checks it before trusting a stream.
pub(crate) fn louds_is_well_formed(louds: &RankedBits) -> bool {
    let mut created = 1usize; // the root
    let mut completed = 0usize; // index of the node whose run is open
    for pos in 0..louds.len() {
        if louds.get(pos) {
            if completed >= created {
                return false;
            }
            created += 1;
        } else {
            completed += 1;
        }
    }
    created == completed
}
