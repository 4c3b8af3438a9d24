//! BLS12-381 message signing (min-pk: signatures in G2).

use blst::min_pk::SecretKey;
use fairchain_types::{BlsSecretKey, BlsSignature};

use crate::error::CryptoError;

/// Domain separation tag for hash-to-G2 in the basic (NUL) ciphersuite.
///
/// Signer and verifier must agree byte for byte; a different tag silently maps
/// every message to a different point and nothing verifies.
pub const SIGNATURE_DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_NUL_";

/// Sign a message with a secret key, returning the compressed signature.
pub fn sign_message(message: &[u8], secret: &BlsSecretKey) -> Result<BlsSignature, CryptoError> {
    let sk = SecretKey::from_bytes(&secret.0)
        .map_err(|e| CryptoError::InvalidKeyMaterial(format!("secret scalar: {e:?}")))?;
    let sig = sk.sign(message, SIGNATURE_DST, &[]);
    Ok(BlsSignature::new(sig.compress()))
}
