//! Block header as delivered by the chain client.
//!
//! The pipeline only hashes the canonical byte form; `number` and `hash` are
//! read for logging and point lookups.

use headerbatch_merkle_tree::{DigestKind, Hash};
use serde::{Deserialize, Serialize};

/// Length of [`BlockHeader::to_bytes`]: number (8) + four 32-byte hashes.
pub const HEADER_BYTES_LEN: usize = 8 + 4 * 32;

/// A Substrate-style block header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    /// Block number.
    pub number: u64,
    /// Hash of this block.
    #[serde(with = "hex_hash")]
    pub hash: Hash,
    /// Hash of the parent block.
    #[serde(with = "hex_hash")]
    pub parent_hash: Hash,
    /// State trie root.
    #[serde(with = "hex_hash")]
    pub state_root: Hash,
    /// Extrinsics trie root.
    #[serde(with = "hex_hash")]
    pub extrinsics_root: Hash,
}

impl BlockHeader {
    /// Canonical serialization: `number (u64 BE) || hash || parent_hash ||
    /// state_root || extrinsics_root`.
    pub fn to_bytes(&self) -> [u8; HEADER_BYTES_LEN] {
        let mut buf = [0u8; HEADER_BYTES_LEN];
        buf[0..8].copy_from_slice(&self.number.to_be_bytes());
        buf[8..40].copy_from_slice(&self.hash);
        buf[40..72].copy_from_slice(&self.parent_hash);
        buf[72..104].copy_from_slice(&self.state_root);
        buf[104..136].copy_from_slice(&self.extrinsics_root);
        buf
    }

    /// The Merkle leaf for this header: the digest of its canonical bytes.
    pub fn leaf(&self, kind: DigestKind) -> Hash {
        kind.digest(&self.to_bytes())
    }

    /// Short hex form of the block hash for log lines.
    pub fn hash_hex(&self) -> String {
        format!("0x{}", hex::encode(self.hash))
    }
}

/// Serde helpers for `0x`-prefixed (or bare) hex hashes.
pub(crate) mod hex_hash {
    use headerbatch_merkle_tree::Hash;
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S: Serializer>(hash: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(hash)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Hash, D::Error> {
        let s = String::deserialize(deserializer)?;
        let digits = s.strip_prefix("0x").unwrap_or(&s);
        let mut hash = [0u8; 32];
        hex::decode_to_slice(digits, &mut hash).map_err(D::Error::custom)?;
        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BlockHeader {
        BlockHeader {
            number: 7,
            hash: [1u8; 32],
            parent_hash: [2u8; 32],
            state_root: [3u8; 32],
            extrinsics_root: [4u8; 32],
        }
    }

    #[test]
    fn canonical_bytes_layout() {
        let bytes = sample().to_bytes();
        assert_eq!(&bytes[0..8], &7u64.to_be_bytes());
        assert_eq!(bytes[8], 1);
        assert_eq!(bytes[40], 2);
        assert_eq!(bytes[72], 3);
        assert_eq!(bytes[135], 4);
    }

    #[test]
    fn leaf_depends_on_every_field() {
        let base = sample();
        let kind = DigestKind::Sha256;
        let mut other = base.clone();
        other.state_root[31] ^= 1;
        assert_ne!(base.leaf(kind), other.leaf(kind));
        assert_eq!(base.leaf(kind), kind.digest(&base.to_bytes()));
    }

    #[test]
    fn json_uses_prefixed_hex() {
        let json = serde_json::to_string(&sample()).expect("serialize");
        assert!(json.contains("\"parentHash\":\"0x0202"));
        let back: BlockHeader = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, sample());
    }

    #[test]
    fn json_accepts_bare_hex_and_rejects_short() {
        let bare = format!(
            r#"{{"number":1,"hash":"{h}","parentHash":"{h}","stateRoot":"{h}","extrinsicsRoot":"{h}"}}"#,
            h = "ab".repeat(32)
        );
        let header: BlockHeader = serde_json::from_str(&bare).expect("bare hex");
        assert_eq!(header.hash, [0xab; 32]);

        let short = bare.replacen(&"ab".repeat(32), "abcd", 1);
        assert!(serde_json::from_str::<BlockHeader>(&short).is_err());
    }
}
