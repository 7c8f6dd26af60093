//! Bech32m codec for Ark addresses
//!
//! A version-0 address packs `version(1) || signer x-only key(32) || VTXO
//! taproot key(32)` into a bech32m string under the `ark` (mainnet) or
//! `tark` (testnet) prefix. The VTXO key is already tweaked, so the derived
//! output script commits to it directly.

use bech32::primitives::decode::{CheckedHrpstring, CheckedHrpstringError};
use bech32::{Bech32m, Hrp};
use bitcoin::key::TweakedPublicKey;
use bitcoin::secp256k1::{Parity, PublicKey, XOnlyPublicKey};
use bitcoin::ScriptBuf;

pub const MAINNET_HRP: Hrp = Hrp::parse_unchecked("ark");
pub const TESTNET_HRP: Hrp = Hrp::parse_unchecked("tark");

/// Byte length of a version-0 payload
const V0_PAYLOAD_LEN: usize = 65;

/// Address-level decode/encode errors
#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error("invalid bech32m string: {0}")]
    Bech32(#[from] CheckedHrpstringError),

    #[error("unknown address prefix {0:?}")]
    UnknownPrefix(String),

    #[error("unsupported address version {0}")]
    UnsupportedVersion(u8),

    #[error("invalid payload length {0}, expected {V0_PAYLOAD_LEN} bytes")]
    PayloadLength(usize),

    #[error("invalid signer public key: {0}")]
    SignerKey(bitcoin::secp256k1::Error),

    #[error("invalid vtxo taproot key: {0}")]
    VtxoKey(bitcoin::secp256k1::Error),

    #[error("address is missing the signer public key")]
    MissingSignerKey,

    #[error("address is missing the vtxo taproot key")]
    MissingVtxoKey,

    #[error("bech32m encoding failed: {0}")]
    Encode(#[from] bech32::EncodeError),
}

/// A decoded Ark address: the operator (signer) key and the taproot output
/// key of the VTXO it pays to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArkAddress {
    pub hrp: Hrp,
    pub version: u8,
    pub signer: Option<PublicKey>,
    pub vtxo_tap_key: Option<PublicKey>,
}

impl ArkAddress {
    pub fn decode(address: &str) -> Result<ArkAddress, AddressError> {
        let checked = CheckedHrpstring::new::<Bech32m>(address)?;
        let hrp = checked.hrp();
        if hrp != MAINNET_HRP && hrp != TESTNET_HRP {
            return Err(AddressError::UnknownPrefix(hrp.to_string()));
        }

        let payload: Vec<u8> = checked.byte_iter().collect();
        if payload.len() != V0_PAYLOAD_LEN {
            return Err(AddressError::PayloadLength(payload.len()));
        }
        let version = payload[0];
        if version != 0 {
            return Err(AddressError::UnsupportedVersion(version));
        }

        let signer = XOnlyPublicKey::from_slice(&payload[1..33]).map_err(AddressError::SignerKey)?;
        let vtxo = XOnlyPublicKey::from_slice(&payload[33..65]).map_err(AddressError::VtxoKey)?;

        Ok(ArkAddress {
            hrp,
            version,
            signer: Some(PublicKey::from_x_only_public_key(signer, Parity::Even)),
            vtxo_tap_key: Some(PublicKey::from_x_only_public_key(vtxo, Parity::Even)),
        })
    }

    pub fn encode(&self) -> Result<String, AddressError> {
        let signer = self.signer.ok_or(AddressError::MissingSignerKey)?;
        let vtxo = self.vtxo_tap_key.ok_or(AddressError::MissingVtxoKey)?;

        let mut payload = Vec::with_capacity(V0_PAYLOAD_LEN);
        payload.push(self.version);
        payload.extend_from_slice(&signer.x_only_public_key().0.serialize());
        payload.extend_from_slice(&vtxo.x_only_public_key().0.serialize());

        Ok(bech32::encode::<Bech32m>(self.hrp, &payload)?)
    }

    /// Taproot output script paying to the (already tweaked) VTXO key.
    pub fn pk_script(&self) -> Result<ScriptBuf, AddressError> {
        let vtxo = self.vtxo_tap_key.ok_or(AddressError::MissingVtxoKey)?;
        let output_key = TweakedPublicKey::dangerous_assume_tweaked(vtxo.x_only_public_key().0);
        Ok(ScriptBuf::new_p2tr_tweaked(output_key))
    }
}
