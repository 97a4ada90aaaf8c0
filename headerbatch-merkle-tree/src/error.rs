use thiserror::Error;

/// Errors from Merkle tree construction and proof handling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MerkleTreeError {
    /// A tree needs at least one leaf.
    #[error("cannot build a Merkle tree from zero leaves")]
    EmptyLeaves,
    /// No leaf with this (hex) value exists in the tree.
    #[error("leaf {0} not found in tree")]
    LeafNotFound(String),
    /// Requested leaf position is past the end of the leaf level.
    #[error("leaf index {index} out of range (leaf count {count})")]
    IndexOutOfRange {
        /// Requested position.
        index: usize,
        /// Number of leaves.
        count: usize,
    },
    /// Level sizes do not describe a binary tree, or a value could not be
    /// parsed.
    #[error("invalid tree shape: {0}")]
    InvalidShape(String),
    /// A proof could not be decoded.
    #[error("invalid proof: {0}")]
    InvalidProof(String),
}
