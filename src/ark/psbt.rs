//! Ark proprietary PSBT fields
//!
//! Ark transactions annotate PSBT inputs through the BIP-174 proprietary
//! key space under the `ark` prefix. Several values of the same field may
//! ride on one input; they are distinguished by an ordinal byte in the key
//! data (which for cosigner keys doubles as the cosigner index).
//!
//! | subtype | field             | value encoding                      |
//! |---------|-------------------|-------------------------------------|
//! | 0x00    | condition witness | consensus-serialised witness stack  |
//! | 0x01    | cosigner key      | 33-byte compressed public key       |
//! | 0x02    | vtxo taproot tree | taptree blob                        |
//! | 0x03    | vtxo tree expiry  | 4-byte LE BIP-68 sequence           |

use std::collections::BTreeMap;

use bitcoin::consensus::encode;
use bitcoin::psbt::raw::ProprietaryKey;
use bitcoin::psbt::Input;
use bitcoin::secp256k1::PublicKey;
use bitcoin::{Sequence, Witness};

use crate::ark::locktime::RelativeLocktime;
use crate::ark::taptree::{TapTree, TapTreeError};

pub const PROPRIETARY_PREFIX: &[u8] = b"ark";

pub const SUBTYPE_CONDITION_WITNESS: u8 = 0x00;
pub const SUBTYPE_COSIGNER_KEY: u8 = 0x01;
pub const SUBTYPE_VTXO_TAPROOT_TREE: u8 = 0x02;
pub const SUBTYPE_VTXO_TREE_EXPIRY: u8 = 0x03;

/// Proprietary-field decode errors
#[derive(Debug, thiserror::Error)]
pub enum PsbtFieldError {
    #[error("invalid condition witness encoding: {0}")]
    Witness(encode::Error),

    #[error("invalid cosigner public key: {0}")]
    CosignerKey(bitcoin::secp256k1::Error),

    #[error("cosigner field key must be a single index byte, got {0} bytes")]
    CosignerIndex(usize),

    #[error("invalid vtxo taproot tree: {0}")]
    TapTree(#[from] TapTreeError),

    #[error("vtxo tree expiry must be a 4-byte sequence, got {0} bytes")]
    ExpiryLength(usize),

    #[error("vtxo tree expiry {0:#010x} does not encode a relative locktime")]
    ExpiryValue(u32),
}

/// One cosigner entry: slot index plus the cosigner's key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CosignerKey {
    pub index: u8,
    pub key: PublicKey,
}

/// Condition witnesses attached to an input, in key order.
pub fn condition_witnesses(input: &Input) -> Result<Vec<Witness>, PsbtFieldError> {
    field_values(input, SUBTYPE_CONDITION_WITNESS)
        .map(|(_, value)| encode::deserialize(value).map_err(PsbtFieldError::Witness))
        .collect()
}

/// Cosigner keys attached to an input, ordered by index.
pub fn cosigner_keys(input: &Input) -> Result<Vec<CosignerKey>, PsbtFieldError> {
    field_values(input, SUBTYPE_COSIGNER_KEY)
        .map(|(key_data, value)| {
            if key_data.len() != 1 {
                return Err(PsbtFieldError::CosignerIndex(key_data.len()));
            }
            let key = PublicKey::from_slice(value).map_err(PsbtFieldError::CosignerKey)?;
            Ok(CosignerKey { index: key_data[0], key })
        })
        .collect()
}

/// VTXO taptrees attached to an input, in key order.
pub fn vtxo_taproot_trees(input: &Input) -> Result<Vec<TapTree>, PsbtFieldError> {
    field_values(input, SUBTYPE_VTXO_TAPROOT_TREE)
        .map(|(_, value)| Ok(TapTree::decode(value)?))
        .collect()
}

/// VTXO tree expiries attached to an input, in key order.
pub fn vtxo_tree_expiries(input: &Input) -> Result<Vec<RelativeLocktime>, PsbtFieldError> {
    field_values(input, SUBTYPE_VTXO_TREE_EXPIRY)
        .map(|(_, value)| {
            let bytes: [u8; 4] = value
                .try_into()
                .map_err(|_| PsbtFieldError::ExpiryLength(value.len()))?;
            let consensus = u32::from_le_bytes(bytes);
            RelativeLocktime::from_sequence(Sequence::from_consensus(consensus))
                .ok_or(PsbtFieldError::ExpiryValue(consensus))
        })
        .collect()
}

/// Appends a condition witness to an input.
pub fn push_condition_witness(input: &mut Input, witness: &Witness) {
    let ordinal = next_ordinal(&input.proprietary, SUBTYPE_CONDITION_WITNESS);
    input.proprietary.insert(
        ark_key(SUBTYPE_CONDITION_WITNESS, vec![ordinal]),
        encode::serialize(witness),
    );
}

/// Attaches a cosigner key under the given slot index.
pub fn push_cosigner_key(input: &mut Input, index: u8, key: &PublicKey) {
    input.proprietary.insert(
        ark_key(SUBTYPE_COSIGNER_KEY, vec![index]),
        key.serialize().to_vec(),
    );
}

/// Appends a VTXO taptree to an input.
pub fn push_vtxo_taproot_tree(input: &mut Input, tree: &TapTree) {
    let ordinal = next_ordinal(&input.proprietary, SUBTYPE_VTXO_TAPROOT_TREE);
    input.proprietary.insert(
        ark_key(SUBTYPE_VTXO_TAPROOT_TREE, vec![ordinal]),
        tree.encode(),
    );
}

/// Attaches a VTXO tree expiry. The locktime must be sequence-encodable.
pub fn push_vtxo_tree_expiry(
    input: &mut Input,
    expiry: RelativeLocktime,
) -> Result<(), crate::ark::locktime::LocktimeError> {
    let ordinal = next_ordinal(&input.proprietary, SUBTYPE_VTXO_TREE_EXPIRY);
    input.proprietary.insert(
        ark_key(SUBTYPE_VTXO_TREE_EXPIRY, vec![ordinal]),
        expiry.to_sequence()?.to_consensus_u32().to_le_bytes().to_vec(),
    );
    Ok(())
}

fn ark_key(subtype: u8, key: Vec<u8>) -> ProprietaryKey {
    ProprietaryKey {
        prefix: PROPRIETARY_PREFIX.to_vec(),
        subtype,
        key,
    }
}

fn field_values(
    input: &Input,
    subtype: u8,
) -> impl Iterator<Item = (&[u8], &[u8])> {
    input
        .proprietary
        .iter()
        .filter(move |(key, _)| key.prefix == PROPRIETARY_PREFIX && key.subtype == subtype)
        .map(|(key, value)| (key.key.as_slice(), value.as_slice()))
}

fn next_ordinal(proprietary: &BTreeMap<ProprietaryKey, Vec<u8>>, subtype: u8) -> u8 {
    proprietary
        .keys()
        .filter(|key| key.prefix == PROPRIETARY_PREFIX && key.subtype == subtype)
        .count() as u8
}
