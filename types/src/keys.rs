//! BLS12-381 key and signature encodings.
//!
//! Public keys live in G1 (48-byte compressed), signatures in G2 (96-byte
//! compressed). These types only carry bytes; decoding into curve points and
//! all validation happens in `fairchain-vrf`.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// A compressed G1 public key bound to one commitment.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlsPublicKey([u8; 48]);

fixed_bytes!(BlsPublicKey, 48, "public key");

/// A compressed G2 signature over one round message.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlsSignature([u8; 96]);

fixed_bytes!(BlsSignature, 96, "signature");

/// A 32-byte BLS secret scalar (big-endian).
///
/// This type intentionally does not implement `Debug`, `Serialize`, or `Clone`
/// to prevent accidental exposure. Key bytes are zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct BlsSecretKey(pub [u8; 32]);

/// A BLS key pair (public + secret).
///
/// Use `fairchain_crypto::keypair_from_ikm()` to construct key pairs.
pub struct BlsKeyPair {
    pub public: BlsPublicKey,
    pub secret: BlsSecretKey,
}
