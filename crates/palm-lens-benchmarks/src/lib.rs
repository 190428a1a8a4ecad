//! Test host for benchmark smoke checks.
//!
//! All behavior lives in `tests/nfr_smoke.rs`; this library target
//! exists only so cargo builds the package.
