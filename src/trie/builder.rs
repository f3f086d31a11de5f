//! Dictionary construction.
//!
//! Build is a single breadth-first pass over the sorted, deduplicated key
//! set. Each queue entry is a contiguous range of keys sharing a prefix of
//! `depth` bytes; processing an entry emits the node's terminal/link flags
//! and its LOUDS degree run, and enqueues one child range per distinct next
//! byte. A range that has narrowed to a single key with bytes remaining
//! stops branching and folds the whole remaining suffix into the shared
//! tail pool.

use std::collections::VecDeque;

use bitvec::prelude::*;
use thiserror::Error;
use tracing::debug;

use super::tails::TailInterner;
use super::Trie;
use crate::bits::RankedBits;
use crate::keyset::KeyBatch;

/// Errors raised while building a dictionary.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The batch held zero keys.
    #[error("cannot build a dictionary from an empty key batch")]
    EmptyInput,

    /// More distinct keys than the dense `u32` id space can address.
    #[error("{0} distinct keys exceed the u32 id space")]
    TooManyKeys(usize),
}

/// A contiguous range of sorted keys sharing their first `depth` bytes.
struct KeyRange {
    lo: usize,
    hi: usize,
    depth: usize,
}

impl Trie {
    /// Consume a batch and build the immutable dictionary.
    ///
    /// Keys are sorted lexicographically and deduplicated first, so the
    /// result depends only on the key *set*: identical sets produce
    /// bit-identical tries regardless of push order. `num_keys` counts
    /// distinct keys.
    pub fn build(batch: KeyBatch) -> Result<Self, BuildError> {
        let mut keys = batch.into_keys();
        if keys.is_empty() {
            return Err(BuildError::EmptyInput);
        }
        keys.sort_unstable();
        keys.dedup();
        let num_keys = keys.len();
        if u32::try_from(num_keys).is_err() {
            return Err(BuildError::TooManyKeys(num_keys));
        }

        let mut louds: BitVec<u64, Lsb0> = BitVec::new();
        let mut terminal: BitVec<u64, Lsb0> = BitVec::new();
        let mut link: BitVec<u64, Lsb0> = BitVec::new();
        let mut labels: Vec<u8> = Vec::new();
        let mut tails = TailInterner::default();

        let mut queue = VecDeque::new();
        queue.push_back(KeyRange {
            lo: 0,
            hi: num_keys,
            depth: 0,
        });

        while let Some(KeyRange { lo, hi, depth }) = queue.pop_front() {
            if hi - lo == 1 && keys[lo].len() > depth {
                // Lone key with bytes left: the rest of the path cannot
                // branch, so it becomes one shared tail instead of a chain
                // of single-child nodes.
                terminal.push(true);
                link.push(true);
                tails.intern(&keys[lo][depth..]);
                louds.push(false);
                continue;
            }

            let ends_here = keys[lo].len() == depth;
            terminal.push(ends_here);
            link.push(false);

            let mut group = if ends_here { lo + 1 } else { lo };
            while group < hi {
                let byte = keys[group][depth];
                let mut end = group + 1;
                while end < hi && keys[end][depth] == byte {
                    end += 1;
                }
                labels.push(byte);
                louds.push(true);
                queue.push_back(KeyRange {
                    lo: group,
                    hi: end,
                    depth: depth + 1,
                });
                group = end;
            }
            louds.push(false);
        }

        let num_nodes = terminal.len();
        debug_assert_eq!(terminal.count_ones(), num_keys);
        debug_assert_eq!(louds.len(), 2 * num_nodes - 1);
        debug_assert_eq!(labels.len(), num_nodes - 1);

        let tails = tails.finish();
        debug!(
            num_keys,
            num_nodes,
            tail_pool = tails.pool_len(),
            "dictionary built"
        );

        Ok(Self {
            louds: RankedBits::new(louds),
            terminal: RankedBits::new(terminal),
            link: RankedBits::new(link),
            labels,
            tails,
            num_keys: num_keys as u32,
        })
    }
}
