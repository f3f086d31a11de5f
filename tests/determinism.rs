//! The serialized dictionary must be a pure function of the key set:
//! push order, duplicates, and repeated rebuilds must never change a byte.

use std::collections::HashSet;

use blake3::hash;
use keytrie::{codec, KeyBatch, QueryCursor, Trie};

const WORDS: &[&[u8]] = &[
    b"ant", b"antelope", b"bee", b"beetle", b"cat", b"car", b"carpet", b"dog", b"dodge", b"zebra",
];

fn encode_from(keys: impl Iterator<Item = &'static [u8]>) -> Vec<u8> {
    let mut batch = KeyBatch::new();
    for key in keys {
        batch.push(key).unwrap();
    }
    let trie = Trie::build(batch).unwrap();
    let mut buf = Vec::new();
    codec::save(&trie, &mut buf).unwrap();
    buf
}

#[test]
fn rebuilds_are_bit_identical() {
    let mut fingerprints = HashSet::new();
    for _ in 0..5 {
        fingerprints.insert(hash(&encode_from(WORDS.iter().copied())));
    }
    assert_eq!(fingerprints.len(), 1, "outputs diverged across runs");
}

#[test]
fn push_order_never_matters() {
    let forward = encode_from(WORDS.iter().copied());
    let backward = encode_from(WORDS.iter().rev().copied());
    assert_eq!(forward, backward);

    // Interleaved order with duplicates sprinkled in.
    let shuffled: Vec<&[u8]> = vec![
        b"carpet", b"ant", b"zebra", b"dog", b"bee", b"cat", b"dodge", b"beetle", b"car",
        b"antelope", b"cat", b"zebra",
    ];
    assert_eq!(encode_from(shuffled.into_iter()), forward);
}

#[test]
fn ids_survive_save_and_load() {
    let bytes = encode_from(WORDS.iter().copied());
    let loaded = codec::load(bytes.as_slice()).unwrap();

    let mut cursor = QueryCursor::new();
    for key in WORDS {
        cursor.set_query(key).unwrap();
        let id = loaded.lookup(&mut cursor).expect("present key found");
        loaded.reverse_lookup(id, &mut cursor).unwrap();
        assert_eq!(cursor.matched_key(), Some(*key));
    }
}
