//! Proof verification. Pure: no tree required.

use crate::{DigestKind, Hash, Proof, SiblingPosition};

impl Proof {
    /// Fold the proof over `leaf` and return the resulting root.
    ///
    /// The running digest starts at the leaf value itself; leaves are
    /// already digests, so they are not hashed again.
    pub fn compute_root(&self, kind: DigestKind, leaf: &Hash) -> Hash {
        self.steps.iter().fold(*leaf, |node, step| match step.position {
            SiblingPosition::Left => kind.digest_pair(&step.sibling, &node),
            SiblingPosition::Right => kind.digest_pair(&node, &step.sibling),
        })
    }

    /// Whether this proof links `leaf` to `claimed_root`.
    ///
    /// Never fails; a proof that does not lead to the root is simply
    /// `false`. An empty proof never verifies, since every tree hashes its
    /// leaf level at least once.
    pub fn verify(&self, kind: DigestKind, leaf: &Hash, claimed_root: &Hash) -> bool {
        if self.steps.is_empty() {
            return false;
        }
        &self.compute_root(kind, leaf) == claimed_root
    }
}
