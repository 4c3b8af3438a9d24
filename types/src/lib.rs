//! Fundamental types for the fairchain protocol.
//!
//! This crate defines the values that flow between every other crate in the
//! workspace: chain seeds, the published commitment, BLS key and signature
//! encodings, and round indices.

#[macro_use]
mod bytes;

pub mod error;
pub mod keys;
pub mod round;
pub mod seed;

pub use error::TypesError;
pub use keys::{BlsKeyPair, BlsPublicKey, BlsSecretKey, BlsSignature};
pub use round::RoundIndex;
pub use seed::{Commitment, Seed};
