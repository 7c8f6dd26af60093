pub mod address;
pub mod psbt;
pub mod script;
pub mod taptree;
