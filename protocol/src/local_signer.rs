//! An in-process signer authority.
//!
//! Stands in for the external signing service in demos and tests. Each
//! commitment gets its own BLS key, derived as
//! `KeyGen(HMAC-SHA256(master, commitment))`, so no per-session key material
//! has to be stored. Only commitments registered through
//! [`KeyRegistry::make_commitment`] are signed for, until they are dropped
//! again with [`LocalSigner::forget`]. A long-lived signer should forget each
//! commitment once its session ends, or the registry grows without bound.

use std::collections::HashSet;
use std::sync::RwLock;

use fairchain_crypto::{hmac_sha256, keypair_from_ikm, sign_message};
use fairchain_types::{BlsKeyPair, BlsPublicKey, BlsSignature, Commitment};
use rand::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::collaborator::{KeyRegistry, SignatureRequest, Signer};
use crate::error::CollaboratorError;

#[derive(Zeroize, ZeroizeOnDrop)]
struct MasterSecret([u8; 32]);

pub struct LocalSigner {
    master: MasterSecret,
    registered: RwLock<HashSet<Commitment>>,
}

impl LocalSigner {
    /// Create a signer with a fresh master secret.
    pub fn new<R>(rng: &mut R) -> Result<Self, CollaboratorError>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        let mut master = [0u8; 32];
        rng.try_fill_bytes(&mut master)
            .map_err(|e| CollaboratorError::Unavailable(format!("signer entropy: {e}")))?;
        let signer = Self::from_master(master);
        master.zeroize();
        Ok(signer)
    }

    /// Create a signer from a fixed master secret (deterministic keys).
    pub fn from_master(master: [u8; 32]) -> Self {
        Self {
            master: MasterSecret(master),
            registered: RwLock::new(HashSet::new()),
        }
    }

    /// Stop signing for `commitment`. Returns whether it was registered.
    pub fn forget(&self, commitment: &Commitment) -> bool {
        let removed = self
            .registered
            .write()
            .map(|mut registered| registered.remove(commitment))
            .unwrap_or(false);
        if removed {
            tracing::debug!(commitment = %commitment, "forgot commitment");
        }
        removed
    }

    /// Number of commitments currently registered.
    pub fn sessions(&self) -> usize {
        self.registered.read().map(|r| r.len()).unwrap_or(0)
    }

    fn session_keypair(&self, commitment: &Commitment) -> Result<BlsKeyPair, CollaboratorError> {
        let mut ikm = hmac_sha256(&self.master.0, commitment.as_bytes());
        let keypair = keypair_from_ikm(&ikm).map_err(|e| CollaboratorError::Rejected(e.to_string()));
        ikm.zeroize();
        keypair
    }
}

impl KeyRegistry for LocalSigner {
    fn make_commitment(&self, commitment: &Commitment) -> Result<BlsPublicKey, CollaboratorError> {
        let keypair = self.session_keypair(commitment)?;
        self.registered
            .write()
            .map_err(|_| CollaboratorError::Unavailable("session registry poisoned".into()))?
            .insert(*commitment);
        tracing::debug!(commitment = %commitment, "registered commitment");
        Ok(keypair.public)
    }
}

impl Signer for LocalSigner {
    fn make_signature(&self, request: &SignatureRequest) -> Result<BlsSignature, CollaboratorError> {
        let session = request.session();
        let known = self
            .registered
            .read()
            .map_err(|_| CollaboratorError::Unavailable("session registry poisoned".into()))?
            .contains(session);
        if !known {
            return Err(CollaboratorError::UnknownCommitment(*session));
        }

        let keypair = self.session_keypair(session)?;
        sign_message(request.message(), &keypair.secret)
            .map_err(|e| CollaboratorError::Rejected(e.to_string()))
    }

    fn name(&self) -> &str {
        "local"
    }
}
