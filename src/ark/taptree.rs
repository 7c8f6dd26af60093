//! Binary codec for VTXO taptrees and taproot output derivation
//!
//! The wire format is a flat list of leaf records, one per tapscript:
//! `depth(1) || leaf version(1) || compact-size length || script bytes`.
//! There is no leaf count; the list ends with the blob. The depth byte is
//! written as 1 and ignored on decode - the tree shape is recomputed by
//! pairing adjacent nodes level by level, an odd trailing node folding into
//! the branch to its left.
//!
//! The combined output key commits the recomputed root under the BIP-341
//! unspendable (NUMS) internal key, so the output has no key-spend path.

use bitcoin::consensus::encode::{self, VarInt};
use bitcoin::consensus::Decodable;
use bitcoin::key::{TapTweak, TweakedPublicKey};
use bitcoin::secp256k1::{Secp256k1, XOnlyPublicKey};
use bitcoin::taproot::{LeafVersion, TapNodeHash};
use bitcoin::{Script, ScriptBuf};

/// Taptree blob decode errors
#[derive(Debug, thiserror::Error)]
pub enum TapTreeError {
    #[error("taptree blob ends mid-leaf")]
    Truncated,

    #[error("unsupported leaf version {0:#04x}")]
    UnsupportedLeafVersion(u8),

    #[error("invalid leaf script length: {0}")]
    LeafLength(encode::Error),

    #[error("taptree has no leaves")]
    Empty,
}

/// The unspendable internal key specified in BIP-0341.
///
/// A "nothing up my sleeve" point; see the BIP text for its derivation.
#[rustfmt::skip] // mangles byte vectors
pub fn unspendable_internal_key() -> XOnlyPublicKey {
    XOnlyPublicKey::from_slice(&[
        0x50, 0x92, 0x9b, 0x74, 0xc1, 0xa0, 0x49, 0x54, 0xb7, 0x8b, 0x4b, 0x60, 0x35, 0xe9, 0x7a, 0x5e,
        0x07, 0x8a, 0x5a, 0x0f, 0x28, 0xec, 0x96, 0xd5, 0x47, 0xbf, 0xee, 0x9a, 0xce, 0x80, 0x3a, 0xc0,
    ])
    .expect("key should be valid")
}

/// Ordered list of tapscript leaves of a VTXO
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TapTree {
    pub leaves: Vec<ScriptBuf>,
}

impl TapTree {
    pub fn new(leaves: Vec<ScriptBuf>) -> Self {
        TapTree { leaves }
    }

    /// Serialises the leaf list. Deterministic: equal trees yield identical
    /// bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut blob = Vec::new();
        for leaf in &self.leaves {
            blob.push(1); // depth, ignored by decoders
            blob.push(LeafVersion::TapScript.to_consensus());
            blob.extend_from_slice(&encode::serialize(&VarInt(leaf.len() as u64)));
            blob.extend_from_slice(leaf.as_bytes());
        }
        blob
    }

    pub fn decode(blob: &[u8]) -> Result<TapTree, TapTreeError> {
        let mut cursor = blob;
        let mut leaves = Vec::new();
        while !cursor.is_empty() {
            if cursor.len() < 2 {
                return Err(TapTreeError::Truncated);
            }
            let version = cursor[1];
            if version != LeafVersion::TapScript.to_consensus() {
                return Err(TapTreeError::UnsupportedLeafVersion(version));
            }
            cursor = &cursor[2..];

            let length = VarInt::consensus_decode(&mut cursor)
                .map_err(TapTreeError::LeafLength)?;
            let length = usize::try_from(length.0).map_err(|_| TapTreeError::Truncated)?;
            if cursor.len() < length {
                return Err(TapTreeError::Truncated);
            }
            let (script, rest) = cursor.split_at(length);
            leaves.push(ScriptBuf::from_bytes(script.to_vec()));
            cursor = rest;
        }
        Ok(TapTree { leaves })
    }

    /// Root of the recomputed leaf tree, `None` for an empty tree.
    pub fn merkle_root(&self) -> Option<TapNodeHash> {
        if self.leaves.is_empty() {
            return None;
        }
        let mut nodes: Vec<TapNodeHash> = self
            .leaves
            .iter()
            .map(|leaf| TapNodeHash::from_script(leaf, LeafVersion::TapScript))
            .collect();
        while nodes.len() > 1 {
            let mut next = Vec::with_capacity(nodes.len().div_ceil(2));
            let mut i = 0;
            while i < nodes.len() {
                if i + 1 < nodes.len() {
                    next.push(TapNodeHash::from_node_hashes(nodes[i], nodes[i + 1]));
                    i += 2;
                } else {
                    // Odd trailing node folds into the branch to its left
                    match next.pop() {
                        Some(previous) => {
                            next.push(TapNodeHash::from_node_hashes(previous, nodes[i]))
                        }
                        None => next.push(nodes[i]),
                    }
                    i += 1;
                }
            }
            nodes = next;
        }
        nodes.first().copied()
    }

    /// Taproot output key committing the tree under the NUMS internal key.
    pub fn output_key(&self) -> Result<TweakedPublicKey, TapTreeError> {
        let root = self.merkle_root().ok_or(TapTreeError::Empty)?;
        let secp = Secp256k1::verification_only();
        let (output_key, _parity) =
            unspendable_internal_key().tap_tweak(&secp, Some(root));
        Ok(output_key)
    }

    /// Taproot output script for this tree.
    pub fn pk_script(&self) -> Result<ScriptBuf, TapTreeError> {
        Ok(ScriptBuf::new_p2tr_tweaked(self.output_key()?))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Script> {
        self.leaves.iter().map(|leaf| leaf.as_script())
    }
}
