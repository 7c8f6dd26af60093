//! Codecs for Ark protocol constructs
//!
//! Everything consensus-level (keys, taproot hashing, script tokenisation,
//! PSBT structure) is delegated to the `bitcoin` crate; these modules only
//! define the Ark-specific formats layered on top.

pub mod address;
pub mod locktime;
pub mod psbt;
pub mod script;
pub mod taptree;
