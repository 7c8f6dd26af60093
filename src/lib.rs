//! Ark Protocol Construct Inspector
//!

pub mod ark;
pub mod cli;
pub mod disasm;
pub mod errors;
pub mod render;
