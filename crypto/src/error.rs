use thiserror::Error;

/// Failures while building or consuming a hash chain.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("random source failure: {0}")]
    RandomSourceFailure(String),

    #[error("invalid chain length: {0}")]
    InvalidLength(usize),

    #[error("hash chain exhausted")]
    ExhaustedChain,

    #[error("reveal {index} does not hash to its predecessor")]
    BrokenLink { index: usize },
}

/// Failures in BLS key handling and signing.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),
}
