//! # Static trie dictionary
//!
//! This library compiles a finite batch of byte-string keys into an
//! immutable, compact dictionary that maps every key to a dense integer id
//! and every id back to its key: the building block behind search indexes,
//! tokenizers, and symbol tables where lookup speed and memory density
//! matter more than mutability.
//!
//! ## Pipeline
//!
//! 1. **Accumulate**: push keys into a [`KeyBatch`] (write-only, streaming).
//! 2. **Build**: [`Trie::build`] consumes the batch once and yields the
//!    immutable trie. Keys are canonicalized (sorted, deduplicated); shape
//!    is stored as a succinct LOUDS bit sequence and unbranching suffixes
//!    fold into a shared tail pool.
//! 3. **Query**: exact-match [`Trie::lookup`] and [`Trie::reverse_lookup`],
//!    driven through a per-query [`QueryCursor`] so repeated queries
//!    allocate nothing. Any number of threads may query one trie
//!    concurrently, one cursor each.
//! 4. **Persist**: [`codec::save`]/[`codec::load`] move a trie through a
//!    versioned, checksummed, byte-order-explicit binary stream.
//!
//! ## Example
//!
//! ```
//! use keytrie::{codec, KeyBatch, QueryCursor, Trie};
//!
//! let mut batch = KeyBatch::new();
//! for key in [b"cat".as_slice(), b"car", b"dog"] {
//!     batch.push(key)?;
//! }
//! let trie = Trie::build(batch)?;
//! assert_eq!(trie.num_keys(), 3);
//!
//! let mut cursor = QueryCursor::new();
//! cursor.set_query(b"car")?;
//! let id = trie.lookup(&mut cursor).expect("car is present");
//!
//! trie.reverse_lookup(id, &mut cursor)?;
//! assert_eq!(cursor.matched_key(), Some(b"car".as_slice()));
//!
//! let mut stream = Vec::new();
//! codec::save(&trie, &mut stream)?;
//! let reloaded = codec::load(stream.as_slice())?;
//! assert_eq!(reloaded.num_keys(), 3);
//! # Ok::<(), anyhow::Error>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod bits; // Rank/select bit sequences underpinning the encoding
pub mod codec; // Versioned binary save/load
pub mod cursor; // Per-query scratch state
pub mod keyset; // Key accumulation ahead of a build
pub mod trie; // Construction and query engine

// Re-exports for convenience
pub use cursor::{CursorError, QueryCursor};
pub use keyset::{KeyBatch, PushError, MAX_KEY_LEN};
pub use trie::{BuildError, KeyId, LookupError, Trie};
