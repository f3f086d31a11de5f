//! Bit sequence with checkpointed rank/select support.
//!
//! This is the backbone of the succinct trie encoding: node degrees,
//! terminal flags, and tail links are all stored as plain bit sequences and
//! navigated through `rank`/`select` queries instead of pointers.

use bitvec::prelude::*;
use thiserror::Error;

/// Number of bits covered by one rank checkpoint (eight `u64` words).
pub const RANK_STRIDE: usize = 512;

const WORDS_PER_STRIDE: usize = RANK_STRIDE / 64;

/// Errors raised when reconstructing a bit sequence from raw words.
#[derive(Debug, Error)]
pub enum BitsError {
    /// Declared bit length does not match the number of words supplied.
    #[error("bit length {bit_len} does not fit {words} words")]
    LengthMismatch {
        /// Declared length in bits.
        bit_len: usize,
        /// Number of 64-bit words supplied.
        words: usize,
    },

    /// Bits beyond the declared length must be zero.
    #[error("nonzero padding bits beyond declared length {bit_len}")]
    DirtyPadding {
        /// Declared length in bits.
        bit_len: usize,
    },
}

/// Immutable bit sequence with a checkpointed rank directory.
///
/// `rank` answers come from a cumulative checkpoint every [`RANK_STRIDE`]
/// bits plus a popcount scan over the remainder; `select` binary-searches
/// the checkpoints and scans forward one word at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedBits {
    bits: BitVec<u64, Lsb0>,
    /// Cumulative one-count at the start of each full stride.
    checkpoints: Vec<u32>,
    ones: u32,
}

impl RankedBits {
    /// Freeze a bit vector and build its rank directory.
    pub fn new(mut bits: BitVec<u64, Lsb0>) -> Self {
        bits.set_uninitialized(false);
        let mut checkpoints = Vec::with_capacity(bits.len() / RANK_STRIDE + 1);
        checkpoints.push(0);
        let mut ones = 0u32;
        for (idx, word) in bits.as_raw_slice().iter().enumerate() {
            ones += word.count_ones();
            if (idx + 1) % WORDS_PER_STRIDE == 0 {
                checkpoints.push(ones);
            }
        }
        Self {
            bits,
            checkpoints,
            ones,
        }
    }

    /// Reassemble a sequence from its raw words, as read back by the codec.
    ///
    /// Rejects inconsistent lengths and nonzero padding bits so a corrupted
    /// stream cannot smuggle in a malformed directory.
    pub fn from_raw(bit_len: usize, words: Vec<u64>) -> Result<Self, BitsError> {
        let expected = bit_len.div_ceil(64);
        if words.len() != expected {
            return Err(BitsError::LengthMismatch {
                bit_len,
                words: words.len(),
            });
        }
        if bit_len % 64 != 0 {
            let mask = !0u64 << (bit_len % 64);
            if let Some(last) = words.last() {
                if last & mask != 0 {
                    return Err(BitsError::DirtyPadding { bit_len });
                }
            }
        }
        let mut bits = BitVec::from_vec(words);
        bits.truncate(bit_len);
        Ok(Self::new(bits))
    }

    /// Length of the sequence in bits.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Total number of set bits.
    pub fn count_ones(&self) -> usize {
        self.ones as usize
    }

    /// Read the bit at `pos`.
    #[inline]
    pub fn get(&self, pos: usize) -> bool {
        self.bits[pos]
    }

    /// Underlying little-endian words (used by the codec).
    pub fn as_raw_words(&self) -> &[u64] {
        self.bits.as_raw_slice()
    }

    /// Number of set bits in `[0, pos)`.
    pub fn rank1(&self, pos: usize) -> usize {
        let pos = pos.min(self.bits.len());
        let words = self.bits.as_raw_slice();
        let checkpoint = pos / RANK_STRIDE;
        let mut count = self.checkpoints[checkpoint] as usize;
        let full_words = pos / 64;
        for word in &words[checkpoint * WORDS_PER_STRIDE..full_words] {
            count += word.count_ones() as usize;
        }
        let rem = pos % 64;
        if rem > 0 {
            count += (words[full_words] & ((1u64 << rem) - 1)).count_ones() as usize;
        }
        count
    }

    /// Number of clear bits in `[0, pos)`.
    pub fn rank0(&self, pos: usize) -> usize {
        let pos = pos.min(self.bits.len());
        pos - self.rank1(pos)
    }

    /// Position of the `k`-th (0-based) set bit, if it exists.
    pub fn select1(&self, k: usize) -> Option<usize> {
        if k >= self.ones as usize {
            return None;
        }
        let stride = self.checkpoints.partition_point(|&c| c as usize <= k) - 1;
        let words = self.bits.as_raw_slice();
        let mut remaining = k - self.checkpoints[stride] as usize;
        let mut word_idx = stride * WORDS_PER_STRIDE;
        loop {
            let ones = words[word_idx].count_ones() as usize;
            if remaining < ones {
                return Some(word_idx * 64 + nth_one(words[word_idx], remaining));
            }
            remaining -= ones;
            word_idx += 1;
        }
    }

    /// Position of the `k`-th (0-based) clear bit, if it exists.
    pub fn select0(&self, k: usize) -> Option<usize> {
        if k >= self.bits.len() - self.ones as usize {
            return None;
        }
        let mut lo = 0usize;
        let mut hi = self.checkpoints.len() - 1;
        while lo < hi {
            let mid = (lo + hi + 1) / 2;
            let zeros = mid * RANK_STRIDE - self.checkpoints[mid] as usize;
            if zeros <= k {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        let stride = lo;
        let words = self.bits.as_raw_slice();
        let mut remaining = k - (stride * RANK_STRIDE - self.checkpoints[stride] as usize);
        let mut word_idx = stride * WORDS_PER_STRIDE;
        loop {
            let zeros = words[word_idx].count_zeros() as usize;
            if remaining < zeros {
                return Some(word_idx * 64 + nth_one(!words[word_idx], remaining));
            }
            remaining -= zeros;
            word_idx += 1;
        }
    }
}

/// Position of the `k`-th (0-based) set bit within a single word.
///
/// Caller guarantees the word holds more than `k` set bits.
#[inline]
fn nth_one(word: u64, k: usize) -> usize {
    let mut word = word;
    for _ in 0..k {
        word &= word - 1;
    }
    word.trailing_zeros() as usize
}
