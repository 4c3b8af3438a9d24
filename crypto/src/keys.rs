//! BLS12-381 key derivation (min-pk: public keys in G1).

use blst::min_pk::SecretKey;
use fairchain_types::{BlsKeyPair, BlsPublicKey, BlsSecretKey};

use crate::error::CryptoError;

/// Derive a key pair from input keying material (deterministic).
///
/// Uses the IETF `KeyGen` procedure; `ikm` must be at least 32 bytes.
pub fn keypair_from_ikm(ikm: &[u8]) -> Result<BlsKeyPair, CryptoError> {
    let sk = SecretKey::key_gen(ikm, &[])
        .map_err(|e| CryptoError::InvalidKeyMaterial(format!("key_gen: {e:?}")))?;
    Ok(BlsKeyPair {
        public: BlsPublicKey::new(sk.sk_to_pk().compress()),
        secret: BlsSecretKey(sk.to_bytes()),
    })
}
