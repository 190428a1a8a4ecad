//! Test host for JSON contract validation.
//!
//! All behavior lives in `tests/contract_validation.rs`; this library
//! target exists only so cargo builds the package.
