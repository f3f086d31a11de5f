//! End-to-end dictionary behaviour: the canonical cat/car/dog scenario,
//! miss handling, dedup policy, and the cursor buffer guard.

use keytrie::{CursorError, KeyBatch, KeyId, LookupError, QueryCursor, Trie};
use test_case::test_case;

fn build(keys: &[&[u8]]) -> Trie {
    let mut batch = KeyBatch::new();
    for key in keys {
        batch.push(key).expect("key within limits");
    }
    Trie::build(batch).expect("non-empty batch builds")
}

fn id_of(trie: &Trie, key: &[u8]) -> Option<KeyId> {
    let mut cursor = QueryCursor::new();
    cursor.set_query(key).expect("query within limits");
    trie.lookup(&mut cursor)
}

fn key_of(trie: &Trie, id: KeyId) -> Vec<u8> {
    let mut cursor = QueryCursor::new();
    trie.reverse_lookup(id, &mut cursor).expect("id in range");
    cursor
        .matched_key()
        .expect("reverse lookup records a key")
        .to_vec()
}

#[test]
fn cat_car_dog_scenario() {
    let trie = build(&[b"cat", b"car", b"dog"]);
    assert_eq!(trie.num_keys(), 3);

    let id = id_of(&trie, b"car").expect("car is present");
    assert!(id < 3);
    assert_eq!(key_of(&trie, id), b"car");

    assert_eq!(id_of(&trie, b"ca"), None);
    assert_eq!(id_of(&trie, b"cars"), None);

    let mut ids: Vec<KeyId> = [b"cat".as_slice(), b"car", b"dog"]
        .iter()
        .map(|key| id_of(&trie, key).expect("present key found"))
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![0, 1, 2]);
}

#[test_case(b"ca"; "proper prefix of a key")]
#[test_case(b"cars"; "proper extension of a key")]
#[test_case(b""; "empty query against non-empty keys")]
#[test_case(b"dot"; "diverges at the last byte")]
#[test_case(b"x"; "diverges at the first byte")]
fn absent_queries_miss(query: &[u8]) {
    let trie = build(&[b"cat", b"car", b"dog"]);
    assert_eq!(id_of(&trie, query), None);
}

#[test]
fn ids_are_dense_and_bijective() {
    let keys: Vec<&[u8]> = vec![
        b"a", b"ab", b"abc", b"abd", b"b", b"ba", b"banana", b"band", b"z", b"zigzag",
    ];
    let trie = build(&keys);
    assert_eq!(trie.num_keys() as usize, keys.len());

    let mut seen: Vec<KeyId> = Vec::new();
    for key in &keys {
        let id = id_of(&trie, key).expect("present key found");
        assert_eq!(key_of(&trie, id).as_slice(), *key);
        seen.push(id);
    }
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), keys.len(), "ids must be distinct");
    assert_eq!(*seen.last().unwrap() as usize, keys.len() - 1);
}

#[test]
fn duplicate_pushes_collapse() {
    let trie = build(&[b"twin", b"twin", b"solo"]);
    assert_eq!(trie.num_keys(), 2);
    assert!(id_of(&trie, b"twin").is_some());
}

#[test]
fn empty_key_is_a_real_key() {
    let trie = build(&[b"", b"nonempty"]);
    assert_eq!(trie.num_keys(), 2);
    let id = id_of(&trie, b"").expect("empty key present");
    assert_eq!(key_of(&trie, id), b"");
}

#[test]
fn cursor_is_reusable_across_queries() {
    let trie = build(&[b"alpha", b"beta", b"gamma"]);
    let mut cursor = QueryCursor::new();

    cursor.set_query(b"beta").unwrap();
    let hit = trie.lookup(&mut cursor).expect("beta is present");
    assert_eq!(cursor.matched_id(), Some(hit));

    cursor.set_query(b"delta").unwrap();
    assert_eq!(trie.lookup(&mut cursor), None);
    assert_eq!(cursor.matched_id(), None);

    cursor.set_query(b"alpha").unwrap();
    assert!(trie.lookup(&mut cursor).is_some());
    assert_eq!(cursor.matched_key(), Some(b"alpha".as_slice()));
}

#[test]
fn current_key_buffer_guard_after_lookup() {
    let trie = build(&[b"carpet"]);
    let mut cursor = QueryCursor::new();
    cursor.set_query(b"carpet").unwrap();
    trie.lookup(&mut cursor).expect("carpet is present");

    let mut short = [0x55u8; 5];
    assert!(matches!(
        cursor.current_key(&mut short),
        Err(CursorError::BufferTooSmall {
            needed: 6,
            capacity: 5
        })
    ));
    assert_eq!(short, [0x55; 5], "guard must not partially write");

    let mut roomy = [0u8; 32];
    let written = cursor.current_key(&mut roomy).unwrap();
    assert_eq!(&roomy[..written], b"carpet");
}

#[test]
fn current_key_after_reverse_lookup() {
    let trie = build(&[b"one", b"two", b"three"]);
    let mut cursor = QueryCursor::new();
    for id in 0..trie.num_keys() {
        trie.reverse_lookup(id, &mut cursor).expect("id in range");
        let mut buf = [0u8; 16];
        let len = cursor.current_key(&mut buf).expect("buffer is large enough");
        assert_eq!(Some(&buf[..len]), cursor.matched_key());
    }
}

#[test]
fn reverse_lookup_range_check() {
    let trie = build(&[b"cat", b"car", b"dog"]);
    let mut cursor = QueryCursor::new();
    assert!(trie.reverse_lookup(2, &mut cursor).is_ok());
    assert!(matches!(
        trie.reverse_lookup(3, &mut cursor),
        Err(LookupError::IdOutOfRange { id: 3, num_keys: 3 })
    ));
    assert!(matches!(
        trie.reverse_lookup(KeyId::MAX, &mut cursor),
        Err(LookupError::IdOutOfRange { .. })
    ));
}

#[test]
fn binary_keys_are_preserved_exactly() {
    let keys: Vec<&[u8]> = vec![&[0x00], &[0x00, 0xFF], &[0xFF, 0x00, 0x7F], &[0x80]];
    let trie = build(&keys);
    for key in &keys {
        let id = id_of(&trie, key).expect("binary key present");
        assert_eq!(key_of(&trie, id).as_slice(), *key);
    }
    assert_eq!(id_of(&trie, &[0x00, 0xFF, 0x01]), None);
}
