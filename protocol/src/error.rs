use fairchain_crypto::ChainError;
use fairchain_types::{Commitment, RoundIndex};
use fairchain_vrf::{OutcomeError, VerifyError};
use thiserror::Error;

/// Failures reported by the signer or key registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("unknown commitment: {0}")]
    UnknownCommitment(Commitment),

    #[error("request rejected: {0}")]
    Rejected(String),
}

/// Session-level failures.
///
/// Everything except [`ProtocolError::ExhaustedChain`] is fatal to the
/// session: once one round fails to verify, no later round can be trusted.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    #[error("random source failure: {0}")]
    RandomSourceFailure(String),

    #[error("round {round}: malformed signature: {reason}")]
    MalformedSignature { round: RoundIndex, reason: String },

    #[error("malformed public key: {0}")]
    MalformedPublicKey(String),

    #[error("round {round}: invalid pairing result: {reason}")]
    InvalidPairingResult {
        round: RoundIndex,
        reason: &'static str,
    },

    #[error("round {round}: signature does not verify")]
    VerificationMismatch { round: RoundIndex },

    #[error("hash chain exhausted")]
    ExhaustedChain,

    #[error("collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("round {round}: outcome derivation failed: {source}")]
    Outcome {
        round: RoundIndex,
        source: OutcomeError,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid session state: {0}")]
    InvalidState(&'static str),

    #[error("session aborted by an earlier failure")]
    SessionAborted,
}

impl ProtocolError {
    /// True for every failure that must halt the session.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ProtocolError::ExhaustedChain)
    }

    pub(crate) fn from_verify(round: RoundIndex, err: VerifyError) -> Self {
        match err {
            VerifyError::MalformedSignature(reason) => {
                ProtocolError::MalformedSignature { round, reason }
            }
            VerifyError::MalformedPublicKey(reason) => ProtocolError::MalformedPublicKey(reason),
            VerifyError::InvalidPairingResult(reason) => {
                ProtocolError::InvalidPairingResult { round, reason }
            }
        }
    }
}

impl From<ChainError> for ProtocolError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::RandomSourceFailure(e) => ProtocolError::RandomSourceFailure(e),
            ChainError::ExhaustedChain => ProtocolError::ExhaustedChain,
            other => ProtocolError::Config(other.to_string()),
        }
    }
}

/// Why a published transcript failed to audit.
#[derive(Debug, Error, PartialEq)]
pub enum AuditError {
    #[error("summary claims {expected} rounds, transcript has {actual}")]
    RoundCount { expected: u64, actual: usize },

    #[error("round {actual} out of order, expected {expected}")]
    RoundOrder {
        expected: RoundIndex,
        actual: RoundIndex,
    },

    #[error("round {round} belongs to a different commitment")]
    ForeignRound { round: RoundIndex },

    #[error("round 1 does not reveal the commitment")]
    WrongFirstReveal,

    #[error("round {round}: seed does not hash to the previous reveal")]
    BrokenLink { round: RoundIndex },

    #[error("terminal seed missing")]
    MissingTerminalSeed,

    #[error("terminal seed does not hash to the last reveal")]
    BrokenTerminalLink,

    #[error("round {round}: signature check failed: {reason}")]
    Signature { round: RoundIndex, reason: String },

    #[error("round {round}: multiplier {actual} does not match recomputed {expected}")]
    MultiplierMismatch {
        round: RoundIndex,
        expected: f64,
        actual: f64,
    },

    #[error("audit setup failed: {0}")]
    Setup(String),
}
