//! # Mech Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Determinism harness for dice-driven resolution
//! - Standard mechs, pilots, weapons and maps
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
