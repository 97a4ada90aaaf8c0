//! Self-verification of freshly built trees.
//!
//! The gate proves every leaf against the tree's own root. Root and proofs
//! come from the same tree, so this catches construction faults and
//! corrupted node data, not adversarial input.

use headerbatch_merkle_tree::{Hash, MerkleTree};
use tracing::debug;

/// Why a tree was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateFailure {
    /// The number of leaves checked differs from the tree's leaf count.
    LeafCountMismatch { expected: usize, actual: usize },
    /// No proof could be generated for the leaf at `index`; checking stops
    /// there.
    LeafNotFound { index: usize },
    /// Proofs for these leaf indices did not lead to the root.
    VerificationFailed { failed_indices: Vec<usize> },
}

/// Outcome of a gate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateVerdict {
    Accepted,
    Rejected(GateFailure),
}

impl GateVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateVerdict::Accepted)
    }
}

/// Decides whether a built tree is consistent enough to persist.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeVerificationGate;

impl TreeVerificationGate {
    /// Prove each of `leaves` by value (first match) and verify it against
    /// `tree.root()`. Accepts only if every proof verifies.
    pub fn check(tree: &MerkleTree, leaves: &[Hash]) -> GateVerdict {
        if let Some(failure) = Self::count_mismatch(tree, leaves) {
            return GateVerdict::Rejected(failure);
        }

        let root = tree.root();
        let mut failed_indices = Vec::new();
        for (index, leaf) in leaves.iter().enumerate() {
            let proof = match tree.proof(leaf) {
                Ok(proof) => proof,
                Err(e) => {
                    debug!(index, error = %e, "no proof for leaf");
                    return GateVerdict::Rejected(GateFailure::LeafNotFound { index });
                }
            };
            if !tree.verify(&proof, leaf, &root) {
                debug!(index, leaf = %hex::encode(leaf), "leaf proof does not reach root");
                failed_indices.push(index);
            }
        }
        Self::verdict(failed_indices)
    }

    /// Like [`check`](Self::check) but proves each leaf by its position, so
    /// a leaf that moved within the tree is also caught.
    pub fn check_positional(tree: &MerkleTree, leaves: &[Hash]) -> GateVerdict {
        if let Some(failure) = Self::count_mismatch(tree, leaves) {
            return GateVerdict::Rejected(failure);
        }

        let root = tree.root();
        let mut failed_indices = Vec::new();
        for (index, leaf) in leaves.iter().enumerate() {
            let verified = tree
                .proof_at(index)
                .map(|proof| tree.verify(&proof, leaf, &root))
                .unwrap_or(false);
            if !verified {
                debug!(index, leaf = %hex::encode(leaf), "positional proof failed");
                failed_indices.push(index);
            }
        }
        Self::verdict(failed_indices)
    }

    fn count_mismatch(tree: &MerkleTree, leaves: &[Hash]) -> Option<GateFailure> {
        (tree.leaf_count() != leaves.len()).then(|| GateFailure::LeafCountMismatch {
            expected: tree.leaf_count(),
            actual: leaves.len(),
        })
    }

    fn verdict(failed_indices: Vec<usize>) -> GateVerdict {
        if failed_indices.is_empty() {
            GateVerdict::Accepted
        } else {
            GateVerdict::Rejected(GateFailure::VerificationFailed { failed_indices })
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use headerbatch_merkle_tree::DigestKind;

    use super::*;

    fn leaves(n: u8) -> Vec<Hash> {
        (0..n).map(|i| DigestKind::Sha256.digest(&[i])).collect()
    }

    #[test]
    fn accepts_built_trees() {
        for n in 1..=9 {
            let l = leaves(n);
            let tree = MerkleTree::build(l.clone(), DigestKind::Sha256).expect("build");
            assert_eq!(TreeVerificationGate::check(&tree, &l), GateVerdict::Accepted);
            assert_eq!(
                TreeVerificationGate::check_positional(&tree, &l),
                GateVerdict::Accepted
            );
        }
    }

    #[test]
    fn accepts_duplicate_leaves() {
        let a = DigestKind::Sha256.digest(b"a");
        let l = vec![a, a, a];
        let tree = MerkleTree::build(l.clone(), DigestKind::Sha256).expect("build");
        assert!(TreeVerificationGate::check(&tree, &l).is_accepted());
    }

    #[test]
    fn rejects_leaf_whose_stored_digest_differs() {
        let l = leaves(4);
        let tree = MerkleTree::build(l.clone(), DigestKind::Sha256).expect("build");
        let mut levels = tree.levels().to_vec();
        levels[0][2] = DigestKind::Sha256.digest(b"substituted");
        let forged = MerkleTree::from_levels(levels, DigestKind::Sha256).expect("shape");

        assert_eq!(
            TreeVerificationGate::check(&forged, &l),
            GateVerdict::Rejected(GateFailure::LeafNotFound { index: 2 })
        );
        assert_matches!(
            TreeVerificationGate::check_positional(&forged, &l),
            GateVerdict::Rejected(GateFailure::VerificationFailed { .. })
        );
    }

    #[test]
    fn rejects_corrupted_internal_node() {
        let l = leaves(4);
        let tree = MerkleTree::build(l.clone(), DigestKind::Sha256).expect("build");
        let mut levels = tree.levels().to_vec();
        levels[1][0] = [0u8; 32];
        let forged = MerkleTree::from_levels(levels, DigestKind::Sha256).expect("shape");

        // leaves 2 and 3 use the corrupted node as their sibling
        assert_eq!(
            TreeVerificationGate::check(&forged, &l),
            GateVerdict::Rejected(GateFailure::VerificationFailed {
                failed_indices: vec![2, 3]
            })
        );
    }

    #[test]
    fn rejects_swapped_leaves_positionally() {
        let l = leaves(4);
        let tree = MerkleTree::build(l.clone(), DigestKind::Sha256).expect("build");
        let mut levels = tree.levels().to_vec();
        levels[0].swap(0, 1);
        let forged = MerkleTree::from_levels(levels, DigestKind::Sha256).expect("shape");

        // each swapped leaf is proven from the slot it moved to
        assert_matches!(
            TreeVerificationGate::check(&forged, &l),
            GateVerdict::Rejected(GateFailure::VerificationFailed { .. })
        );
        assert_eq!(
            TreeVerificationGate::check_positional(&forged, &l),
            GateVerdict::Rejected(GateFailure::VerificationFailed {
                failed_indices: vec![0, 1]
            })
        );
    }

    #[test]
    fn rejects_count_mismatch() {
        let l = leaves(4);
        let tree = MerkleTree::build(l.clone(), DigestKind::Sha256).expect("build");
        assert_eq!(
            TreeVerificationGate::check(&tree, &l[..3]),
            GateVerdict::Rejected(GateFailure::LeafCountMismatch {
                expected: 4,
                actual: 3
            })
        );
    }
}
