//! Shared storage for tail-compressed suffixes.

use std::collections::HashMap;

/// Byte pool holding every folded suffix, with one `(start, len)` span per
/// tail-bearing node in level order. Identical tails share one span of the
/// pool instead of being stored per key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TailStore {
    pub(crate) starts: Vec<u32>,
    pub(crate) lens: Vec<u32>,
    pub(crate) bytes: Vec<u8>,
}

impl TailStore {
    /// Tail bytes for the `idx`-th tail-bearing node.
    pub(crate) fn get(&self, idx: usize) -> &[u8] {
        let start = self.starts[idx] as usize;
        let len = self.lens[idx] as usize;
        &self.bytes[start..start + len]
    }

    /// Number of tail spans (one per tail-bearing node).
    pub(crate) fn num_tails(&self) -> usize {
        self.starts.len()
    }

    /// Size of the shared byte pool.
    pub(crate) fn pool_len(&self) -> usize {
        self.bytes.len()
    }

    /// Check every span stays inside the pool and is non-empty.
    ///
    /// Tails are never empty by construction, so a zero-length span in a
    /// loaded stream is a structural inconsistency.
    pub(crate) fn spans_are_valid(&self) -> bool {
        self.starts.len() == self.lens.len()
            && self
                .starts
                .iter()
                .zip(&self.lens)
                .all(|(&start, &len)| {
                    len > 0 && (start as u64 + len as u64) <= self.bytes.len() as u64
                })
    }
}

/// Build-time interner: appends one span per tail node, reusing pool bytes
/// when an identical tail was interned before.
#[derive(Debug, Default)]
pub(crate) struct TailInterner {
    store: TailStore,
    seen: HashMap<Vec<u8>, (u32, u32)>,
}

impl TailInterner {
    /// Record the tail for the next tail-bearing node in level order.
    pub(crate) fn intern(&mut self, tail: &[u8]) {
        debug_assert!(!tail.is_empty());
        let (start, len) = match self.seen.get(tail) {
            Some(&span) => span,
            None => {
                let span = (self.store.bytes.len() as u32, tail.len() as u32);
                self.store.bytes.extend_from_slice(tail);
                self.seen.insert(tail.to_vec(), span);
                span
            }
        };
        self.store.starts.push(start);
        self.store.lens.push(len);
    }

    pub(crate) fn finish(self) -> TailStore {
        self.store
    }
}
