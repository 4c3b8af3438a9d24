//! Interfaces to the signer authority and key registry.
//!
//! The core only needs synchronous request/response calls. Implementations
//! must be safe to share across concurrently running sessions; retries and
//! timeouts, if any, live behind these traits.

use fairchain_types::{BlsPublicKey, BlsSignature, Commitment, RoundIndex};

use crate::error::CollaboratorError;

/// A request for one round signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignatureRequest {
    /// Keyed by the chain commitment; the authority signs `message`.
    Commitment {
        commitment: Commitment,
        message: Vec<u8>,
        round: RoundIndex,
    },
    /// Keyed by the game-server seed hash; the authority signs `contribution`.
    Contribution {
        seed_hash: Commitment,
        contribution: [u8; 32],
        round: RoundIndex,
    },
}

impl SignatureRequest {
    /// The bytes the authority signs and the verifier checks.
    pub fn message(&self) -> &[u8] {
        match self {
            SignatureRequest::Commitment { message, .. } => message,
            SignatureRequest::Contribution { contribution, .. } => contribution,
        }
    }

    /// The commitment identifying the signing session.
    pub fn session(&self) -> &Commitment {
        match self {
            SignatureRequest::Commitment { commitment, .. } => commitment,
            SignatureRequest::Contribution { seed_hash, .. } => seed_hash,
        }
    }

    pub fn round(&self) -> RoundIndex {
        match self {
            SignatureRequest::Commitment { round, .. }
            | SignatureRequest::Contribution { round, .. } => *round,
        }
    }
}

/// Issues per-round signatures.
pub trait Signer: Send + Sync {
    fn make_signature(&self, request: &SignatureRequest) -> Result<BlsSignature, CollaboratorError>;

    /// Human-readable name of this signer.
    fn name(&self) -> &str;
}

/// Binds a verification key to a commitment.
pub trait KeyRegistry: Send + Sync {
    /// Register `commitment` and return the public key its rounds are signed
    /// under. Called once per session.
    fn make_commitment(&self, commitment: &Commitment) -> Result<BlsPublicKey, CollaboratorError>;
}
