//! Nullable infrastructure for deterministic testing.
//!
//! The randomness source and the signer authority are the only things a
//! session does not own. This crate provides test-friendly versions of both
//! that:
//! - Return deterministic values
//! - Can be told to fail on cue
//! - Record what they were asked for
//!
//! Usage: swap the OS random source and the real signer for nullables in tests.

pub mod random;
pub mod signer;

pub use random::{FailingRandom, NullRandom};
pub use signer::{Fault, NullSigner};
