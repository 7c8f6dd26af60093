//! Integration Tests Module
//!
//! End-to-end tests that run each decode pipeline from raw input to
//! rendered report.

pub mod closure_reports;
pub mod psbt_fields;
pub mod taptree_blob;
