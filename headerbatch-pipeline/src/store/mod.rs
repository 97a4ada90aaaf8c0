//! Append-only store of accepted trees.
//!
//! The pipeline is the single writer. An append must be visible to
//! [`TreeStore::size`] and [`TreeStore::list`] as soon as it returns.

mod file;
mod mem;

#[cfg(test)]
mod tests;

use bincode::{Decode, Encode};
use headerbatch_merkle_tree::{DigestKind, Hash, MerkleTree, MerkleTreeError};
use thiserror::Error;

pub use file::FileTreeStore;
pub use mem::MemTreeStore;

use crate::gate::TreeVerificationGate;

/// Errors from tree store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encoding error: {0}")]
    Encoding(String),
    #[error("corrupted store: {0}")]
    Corrupted(String),
    #[error("append rejected: {0}")]
    Rejected(String),
}

/// A stored tree: its root and leaf set, enough to rebuild and re-verify.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct StoredTree {
    /// 0-based index of the batch this tree was built from, counting
    /// rejected batches too.
    pub batch_index: u64,
    /// Number of the first header in the batch.
    pub first_number: u64,
    /// Number of the last header in the batch.
    pub last_number: u64,
    /// Digest the tree was built with.
    pub digest: DigestKind,
    /// Tree root.
    pub root: Hash,
    /// Leaves in tree order.
    pub leaves: Vec<Hash>,
}

impl StoredTree {
    /// Snapshot a built tree.
    pub fn from_tree(
        batch_index: u64,
        first_number: u64,
        last_number: u64,
        tree: &MerkleTree,
    ) -> Self {
        Self {
            batch_index,
            first_number,
            last_number,
            digest: tree.digest_kind(),
            root: tree.root(),
            leaves: tree.leaves().to_vec(),
        }
    }

    /// Rebuild the full tree from the stored leaves.
    pub fn rebuild(&self) -> Result<MerkleTree, MerkleTreeError> {
        MerkleTree::build(self.leaves.clone(), self.digest)
    }

    /// Rebuild the tree, check it still has the stored root, and run the
    /// verification gate over it.
    pub fn reverify(&self) -> bool {
        match self.rebuild() {
            Ok(tree) => {
                tree.root() == self.root
                    && TreeVerificationGate::check(&tree, &self.leaves).is_accepted()
            }
            Err(_) => false,
        }
    }

    /// Hex root with `0x` prefix, for log lines.
    pub fn root_hex(&self) -> String {
        format!("0x{}", hex::encode(self.root))
    }
}

/// Append-only list of accepted trees.
pub trait TreeStore {
    /// Append one tree. On error the store is unchanged.
    fn append(&mut self, tree: StoredTree) -> Result<(), StoreError>;
    /// All stored trees in append order.
    fn list(&self) -> Result<Vec<StoredTree>, StoreError>;
    /// Number of stored trees.
    fn size(&self) -> usize;
}

impl<T: TreeStore + ?Sized> TreeStore for &mut T {
    fn append(&mut self, tree: StoredTree) -> Result<(), StoreError> {
        (**self).append(tree)
    }

    fn list(&self) -> Result<Vec<StoredTree>, StoreError> {
        (**self).list()
    }

    fn size(&self) -> usize {
        (**self).size()
    }
}
