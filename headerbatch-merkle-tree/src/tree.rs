use crate::{
    DigestKind, Hash, MerkleTreeError,
    proof::{Proof, ProofStep, SiblingPosition},
};

/// An immutable binary Merkle tree over an ordered sequence of leaf digests.
///
/// Levels are stored bottom-up: `levels[0]` holds the leaves in arrival
/// order, the last level holds only the root. Leaves are never reordered or
/// deduplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    kind: DigestKind,
    levels: Vec<Vec<Hash>>,
}

impl MerkleTree {
    /// Build a tree from the given leaves.
    ///
    /// Each level pairs nodes in order; a trailing unpaired node is hashed
    /// with itself. Returns [`MerkleTreeError::EmptyLeaves`] for an empty
    /// input.
    pub fn build(leaves: Vec<Hash>, kind: DigestKind) -> Result<Self, MerkleTreeError> {
        if leaves.is_empty() {
            return Err(MerkleTreeError::EmptyLeaves);
        }

        let mut levels = vec![leaves];
        loop {
            let current = &levels[levels.len() - 1];
            let next: Vec<Hash> = current
                .chunks(2)
                .map(|pair| {
                    let right = pair.get(1).unwrap_or(&pair[0]);
                    kind.digest_pair(&pair[0], right)
                })
                .collect();
            let done = next.len() == 1;
            levels.push(next);
            if done {
                break;
            }
        }

        Ok(Self { kind, levels })
    }

    /// Reconstitute a tree from stored levels.
    ///
    /// Only the shape is validated (level sizes and a single root). Node
    /// digests are taken as given; use a proof check to detect
    /// inconsistent hashes.
    pub fn from_levels(levels: Vec<Vec<Hash>>, kind: DigestKind) -> Result<Self, MerkleTreeError> {
        if levels.len() < 2 || levels[0].is_empty() {
            return Err(MerkleTreeError::InvalidShape(format!(
                "expected at least a leaf level and a root level, got {} levels",
                levels.len()
            )));
        }
        for (height, pair) in levels.windows(2).enumerate() {
            let expected = pair[0].len().div_ceil(2);
            if pair[1].len() != expected {
                return Err(MerkleTreeError::InvalidShape(format!(
                    "level {} has {} nodes, expected {}",
                    height + 1,
                    pair[1].len(),
                    expected
                )));
            }
            // Only the top level may hold a single node.
            if height + 2 < levels.len() && pair[1].len() == 1 {
                return Err(MerkleTreeError::InvalidShape(format!(
                    "level {} already has a single node but is not the root",
                    height + 1
                )));
            }
        }
        let top = levels[levels.len() - 1].len();
        if top != 1 {
            return Err(MerkleTreeError::InvalidShape(format!(
                "top level has {} nodes, expected a single root",
                top
            )));
        }
        Ok(Self { kind, levels })
    }

    /// The apex digest.
    pub fn root(&self) -> Hash {
        self.levels[self.levels.len() - 1][0]
    }

    /// The leaves in the order the tree was built from.
    pub fn leaves(&self) -> &[Hash] {
        &self.levels[0]
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Number of steps in every proof of this tree.
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    /// The digest this tree was built with.
    pub fn digest_kind(&self) -> DigestKind {
        self.kind
    }

    /// All levels, leaves first.
    pub fn levels(&self) -> &[Vec<Hash>] {
        &self.levels
    }

    /// Position of the first leaf equal to `leaf`.
    pub fn position_of(&self, leaf: &Hash) -> Option<usize> {
        self.levels[0].iter().position(|l| l == leaf)
    }

    /// Generate an inclusion proof for `leaf`.
    ///
    /// When the same value occurs more than once, the proof is for its
    /// first occurrence.
    pub fn proof(&self, leaf: &Hash) -> Result<Proof, MerkleTreeError> {
        let index = self
            .position_of(leaf)
            .ok_or_else(|| MerkleTreeError::LeafNotFound(hex::encode(leaf)))?;
        self.proof_at(index)
    }

    /// Generate an inclusion proof for the leaf at `index`.
    pub fn proof_at(&self, index: usize) -> Result<Proof, MerkleTreeError> {
        let count = self.leaf_count();
        if index >= count {
            return Err(MerkleTreeError::IndexOutOfRange { index, count });
        }

        let mut steps = Vec::with_capacity(self.depth());
        let mut position = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let step = if position % 2 == 0 {
                // Unpaired trailing node is its own right sibling.
                let sibling = level.get(position + 1).unwrap_or(&level[position]);
                ProofStep {
                    sibling: *sibling,
                    position: SiblingPosition::Right,
                }
            } else {
                ProofStep {
                    sibling: level[position - 1],
                    position: SiblingPosition::Left,
                }
            };
            steps.push(step);
            position /= 2;
        }

        Ok(Proof { steps })
    }

    /// Check `proof` for `leaf` against `claimed_root` using this tree's
    /// digest.
    pub fn verify(&self, proof: &Proof, leaf: &Hash, claimed_root: &Hash) -> bool {
        proof.verify(self.kind, leaf, claimed_root)
    }
}
