//! The single configured digest used for leaves and internal nodes.

use std::{fmt, str::FromStr};

use bincode::{Decode, Encode};
use sha2::{Digest as _, Sha256};

use crate::MerkleTreeError;

/// A 32-byte digest.
pub type Hash = [u8; 32];

/// All-zero digest, used as a placeholder before any tree exists.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Which hash function a tree is built and verified with.
///
/// Construction and verification must agree, so every tree records the kind
/// it was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DigestKind {
    /// SHA-256.
    #[default]
    Sha256,
    /// BLAKE3 with 32-byte output.
    Blake3,
}

impl DigestKind {
    /// Hash an arbitrary byte string. Empty input is valid.
    pub fn digest(&self, data: &[u8]) -> Hash {
        match self {
            DigestKind::Sha256 => Sha256::digest(data).into(),
            DigestKind::Blake3 => *blake3::hash(data).as_bytes(),
        }
    }

    /// Hash the concatenation `left || right` without building the
    /// concatenated buffer.
    pub fn digest_pair(&self, left: &Hash, right: &Hash) -> Hash {
        match self {
            DigestKind::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(left);
                hasher.update(right);
                hasher.finalize().into()
            }
            DigestKind::Blake3 => {
                let mut hasher = blake3::Hasher::new();
                hasher.update(left);
                hasher.update(right);
                *hasher.finalize().as_bytes()
            }
        }
    }

    /// Configuration name of this digest.
    pub fn name(&self) -> &'static str {
        match self {
            DigestKind::Sha256 => "sha256",
            DigestKind::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for DigestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestKind {
    type Err = MerkleTreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(DigestKind::Sha256),
            "blake3" => Ok(DigestKind::Blake3),
            other => Err(MerkleTreeError::InvalidShape(format!(
                "unknown digest '{}', expected sha256 or blake3",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_matches_known_vector() {
        let h = DigestKind::Sha256.digest(b"abc");
        assert_eq!(
            hex::encode(h),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn empty_input_is_deterministic() {
        for kind in [DigestKind::Sha256, DigestKind::Blake3] {
            assert_eq!(kind.digest(b""), kind.digest(b""));
        }
        assert_eq!(
            hex::encode(DigestKind::Sha256.digest(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn pair_digest_equals_concatenation() {
        let a = DigestKind::Sha256.digest(b"a");
        let b = DigestKind::Sha256.digest(b"b");
        for kind in [DigestKind::Sha256, DigestKind::Blake3] {
            let mut concat = Vec::with_capacity(64);
            concat.extend_from_slice(&a);
            concat.extend_from_slice(&b);
            assert_eq!(kind.digest_pair(&a, &b), kind.digest(&concat));
            assert_ne!(kind.digest_pair(&a, &b), kind.digest_pair(&b, &a));
        }
    }

    #[test]
    fn parse_and_display() {
        assert_eq!("sha256".parse::<DigestKind>(), Ok(DigestKind::Sha256));
        assert_eq!("BLAKE3".parse::<DigestKind>(), Ok(DigestKind::Blake3));
        assert!("md5".parse::<DigestKind>().is_err());
        assert_eq!(DigestKind::Blake3.to_string(), "blake3");
    }
}
