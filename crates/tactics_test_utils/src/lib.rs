//! # Tactics Test Utilities
//!
//! Shared testing utilities for all crates:
//! - ASCII map and level fixtures
//! - Brute-force reference search
//! - Determinism test harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod reference;

/// Re-export proptest for convenience.
pub use proptest;
