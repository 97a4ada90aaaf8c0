//! Inclusion proofs for [`MerkleTree`](crate::MerkleTree) leaves.
//!
//! A proof is the ordered list of sibling digests from a leaf up to the
//! root, each tagged with the side the sibling sits on. The side fixes the
//! concatenation order at verification time.

use bincode::{Decode, Encode};

use crate::{Hash, MerkleTreeError};


/// Upper bound on proof steps accepted when decoding. A tree over `2^64`
/// leaves needs 64 steps.
pub(crate) const MAX_PROOF_STEPS: usize = 64;

/// Which side of the running node a sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SiblingPosition {
    /// Sibling is the left operand: `H(sibling || node)`.
    Left,
    /// Sibling is the right operand: `H(node || sibling)`.
    Right,
}

/// One level of an inclusion proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct ProofStep {
    /// Digest of the sibling node at this level.
    pub sibling: Hash,
    /// Side the sibling sits on.
    pub position: SiblingPosition,
}

/// An inclusion proof, ordered from the leaf level up to the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode)]
pub struct Proof {
    /// Proof steps, leaf level first.
    pub steps: Vec<ProofStep>,
}

impl Proof {
    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the proof has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Index of the proved leaf, read back from the sibling positions.
    pub fn leaf_index(&self) -> u64 {
        self.steps
            .iter()
            .enumerate()
            .filter(|(height, step)| *height < 64 && step.position == SiblingPosition::Left)
            .fold(0u64, |acc, (height, _)| acc | (1u64 << height))
    }

    /// Encode to bytes using bincode.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>, MerkleTreeError> {
        let config = bincode::config::standard()
            .with_big_endian()
            .with_no_limit();
        bincode::encode_to_vec(self, config)
            .map_err(|e| MerkleTreeError::InvalidProof(format!("encode error: {}", e)))
    }

    /// Decode from bytes using bincode.
    pub fn decode_from_slice(bytes: &[u8]) -> Result<Self, MerkleTreeError> {
        let config = bincode::config::standard()
            .with_big_endian()
            .with_limit::<{ 64 * 1024 }>();
        let (proof, read): (Self, usize) = bincode::decode_from_slice(bytes, config)
            .map_err(|e| MerkleTreeError::InvalidProof(format!("decode error: {}", e)))?;
        if read != bytes.len() {
            return Err(MerkleTreeError::InvalidProof(format!(
                "{} trailing bytes after proof",
                bytes.len() - read
            )));
        }
        if proof.steps.len() > MAX_PROOF_STEPS {
            return Err(MerkleTreeError::InvalidProof(format!(
                "proof has {} steps (max {})",
                proof.steps.len(),
                MAX_PROOF_STEPS
            )));
        }
        Ok(proof)
    }
}
