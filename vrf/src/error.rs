use thiserror::Error;

/// Structural failures during signature verification.
///
/// A well-formed signature that simply does not match is not an error; it is
/// reported as `Ok(false)` by [`crate::verify`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("malformed public key: {0}")]
    MalformedPublicKey(String),

    #[error("invalid pairing result: {0}")]
    InvalidPairingResult(&'static str),
}

#[derive(Debug, Error, PartialEq)]
pub enum OutcomeError {
    #[error("hmac derivation requires the next seed in the chain")]
    MissingNextSeed,

    #[error("house edge must be in [0, 1), got {0}")]
    InvalidHouseEdge(f64),

    #[error("digest stayed on the boundary after {0} resamples")]
    BoundaryUnresolved(usize),
}
