//! Binary Merkle tree over pre-hashed leaves.
//!
//! Leaves are 32-byte digests (typically of serialized block headers). Each
//! level is built pairwise in order, `parent = H(left || right)`. A trailing
//! unpaired node is paired with itself, `H(node || node)`, and level 0 is
//! always hashed at least once, so a single leaf `L` has root `H(L || L)`.
//!
//! Inclusion proofs are ordered `(sibling, position)` steps from the leaf up
//! to the root. Verification starts from the leaf value itself.

#![warn(missing_docs)]

mod digest;
mod error;
pub(crate) mod proof;
pub(crate) mod tree;
mod verify;


pub use digest::{DigestKind, Hash, ZERO_HASH};
pub use error::MerkleTreeError;
pub use proof::{Proof, ProofStep, SiblingPosition};
pub use tree::MerkleTree;
