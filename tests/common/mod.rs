//! Common Test Utilities
//!
//! Shared keys and script fixtures used across the integration tests.

use bitcoin::secp256k1::{Parity, PublicKey, XOnlyPublicKey};

use ark_inspect::ark::script::MultisigClosure;

/// Well-known valid x-only keys, usable wherever a test needs distinct
/// signers.
pub const KEY_HEX: [&str; 4] = [
    "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
    "f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f9",
    "dff1d77f2a671c5f36183726db2341be58feae1da2deced843240f7b502ba659",
    "defdea4cdb677750a420fee807eacf21eb9898ae79b9768766e4faa04a2d4a34",
];

/// First `count` test keys, normalised to even parity the way decoded
/// closures are.
pub fn test_keys(count: usize) -> Vec<PublicKey> {
    KEY_HEX
        .iter()
        .take(count)
        .map(|hex_key| {
            let bytes = hex::decode(hex_key).expect("valid hex");
            let xonly = XOnlyPublicKey::from_slice(&bytes).expect("valid key");
            PublicKey::from_x_only_public_key(xonly, Parity::Even)
        })
        .collect()
}

pub fn multisig(count: usize) -> MultisigClosure {
    MultisigClosure::new(test_keys(count))
}
