//! Cryptographic primitives for the fairchain protocol.
//!
//! - **SHA-256** for the hash chain and the hash-of-signature derivation
//! - **HMAC-SHA256** for contributions and the next-seed derivation
//! - **BLS12-381** (min-pk: keys in G1, signatures in G2) key derivation and signing

pub mod chain;
pub mod error;
pub mod hash;
pub mod keys;
pub mod sign;

pub use chain::{verify_link, verify_reveals, GeneratedChain, HashChain, HashChainGenerator};
pub use error::{ChainError, CryptoError};
pub use hash::{hmac_sha256, sha256};
pub use keys::keypair_from_ikm;
pub use sign::{sign_message, SIGNATURE_DST};
