use assert_matches::assert_matches;
use headerbatch_merkle_tree::{DigestKind, MerkleTree};

use super::*;

fn stored(batch_index: u64, kind: DigestKind) -> StoredTree {
    let leaves: Vec<Hash> = (0..3u64)
        .map(|i| kind.digest(&(batch_index * 10 + i).to_be_bytes()))
        .collect();
    let tree = MerkleTree::build(leaves, kind).expect("build");
    StoredTree::from_tree(batch_index, batch_index * 3, batch_index * 3 + 2, &tree)
}

#[test]
fn mem_store_appends_in_order() {
    let mut store = MemTreeStore::new();
    assert_eq!(store.size(), 0);
    store.append(stored(0, DigestKind::Sha256)).expect("append");
    store.append(stored(1, DigestKind::Sha256)).expect("append");
    assert_eq!(store.size(), 2);
    let list = store.list().expect("list");
    assert_eq!(list[0].batch_index, 0);
    assert_eq!(list[1].batch_index, 1);
}

#[test]
fn stored_tree_reverifies() {
    let entry = stored(4, DigestKind::Blake3);
    assert!(entry.reverify());
    let rebuilt = entry.rebuild().expect("rebuild");
    assert_eq!(rebuilt.root(), entry.root);
    assert_eq!(rebuilt.digest_kind(), DigestKind::Blake3);
}

#[test]
fn stored_tree_with_wrong_root_fails_reverify() {
    let mut entry = stored(0, DigestKind::Sha256);
    entry.root[0] ^= 0x80;
    assert!(!entry.reverify());

    let mut entry = stored(0, DigestKind::Sha256);
    entry.leaves[1][5] ^= 1;
    assert!(!entry.reverify());

    let mut entry = stored(0, DigestKind::Sha256);
    entry.leaves.clear();
    assert!(!entry.reverify());
}

#[test]
fn file_store_persists_across_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("trees.bin");

    {
        let mut store = FileTreeStore::open(&path).expect("open new");
        assert_eq!(store.size(), 0);
        store.append(stored(0, DigestKind::Sha256)).expect("append");
        store.append(stored(1, DigestKind::Blake3)).expect("append");
    }

    let reopened = FileTreeStore::open(&path).expect("reopen");
    assert_eq!(reopened.size(), 2);
    let list = reopened.list().expect("list");
    assert_eq!(list, vec![stored(0, DigestKind::Sha256), stored(1, DigestKind::Blake3)]);
    assert!(list.iter().all(StoredTree::reverify));
}

#[test]
fn file_store_rejects_unknown_format() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("trees.bin");
    std::fs::write(&path, [0x7f, 0, 0]).expect("write");
    assert_matches!(FileTreeStore::open(&path), Err(StoreError::Corrupted(_)));
}

#[test]
fn file_store_rejects_truncated_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("trees.bin");
    {
        let mut store = FileTreeStore::open(&path).expect("open");
        store.append(stored(0, DigestKind::Sha256)).expect("append");
    }
    let bytes = std::fs::read(&path).expect("read");
    std::fs::write(&path, &bytes[..bytes.len() - 5]).expect("truncate");
    assert_matches!(FileTreeStore::open(&path), Err(StoreError::Corrupted(_)));

    std::fs::write(&path, b"").expect("empty");
    assert_matches!(FileTreeStore::open(&path), Err(StoreError::Corrupted(_)));
}

#[test]
fn failed_file_append_leaves_store_unchanged() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("missing-dir").join("trees.bin");
    let mut store = FileTreeStore::open(&path).expect("open");
    assert_matches!(
        store.append(stored(0, DigestKind::Sha256)),
        Err(StoreError::Io(_))
    );
    assert_eq!(store.size(), 0);
}
