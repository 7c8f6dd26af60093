use thiserror::Error;

use crate::ark::address::AddressError;
use crate::ark::psbt::PsbtFieldError;
use crate::ark::script::ClosureError;
use crate::ark::taptree::TapTreeError;
use crate::disasm::DisasmError;

/// Application-wide error type - single point of truth
#[derive(Error, Debug)]
pub enum AppError {
    /// Hex arguments
    #[error("failed to decode hex string: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Ark address decoding
    #[error("failed to decode address: {0}")]
    Address(#[from] AddressError),

    /// Closure classification
    #[error("failed to decode closure: {0}")]
    Closure(#[from] ClosureError),

    /// Mandatory script disassembly
    #[error("failed to disassemble script: {0}")]
    Disasm(#[from] DisasmError),

    /// Taptree blob decoding and output derivation
    #[error("failed to decode taptree: {0}")]
    TapTree(#[from] TapTreeError),

    /// Leaf script arguments of `taptree encode`
    #[error("failed to decode input script [{index}]: {source}")]
    LeafScript {
        index: usize,
        source: hex::FromHexError,
    },

    /// PSBT structure parsing
    #[error("failed to parse PSBT: {0}")]
    Psbt(#[from] bitcoin::psbt::Error),

    /// PSBT argument that is neither base64 nor hex
    #[error("failed to decode PSBT (tried base64 and hex)")]
    PsbtEncoding,

    /// Ark proprietary field parsing
    #[error("failed to decode ark field: {0}")]
    PsbtField(#[from] PsbtFieldError),
}

/// Application-wide result type - single point of truth
pub type AppResult<T> = Result<T, AppError>;
