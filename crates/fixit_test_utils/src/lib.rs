//! # Fix-It Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Determinism test harness
//! - Layout and input fixtures
//! - A presenter that records everything it is told
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod recording;

/// Re-export proptest for convenience.
pub use proptest;
