//! Nullable signer authority with scripted faults.

use std::sync::Mutex;

use fairchain_protocol::{
    CollaboratorError, KeyRegistry, LocalSigner, SignatureRequest, Signer,
};
use fairchain_types::{BlsPublicKey, BlsSignature, Commitment};

/// How the nullable signer misbehaves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Fault {
    /// Sign honestly.
    #[default]
    None,
    /// Flip the low bit of the last signature byte from this round on.
    FlipBit { from_round: u64 },
    /// Return a byte string that is not a G2 point from this round on.
    Garbage { from_round: u64 },
    /// Sign every round with a key other than the registered one.
    WrongKey,
    /// Report the authority as unreachable from this round on.
    Unavailable { from_round: u64 },
    /// Refuse to register commitments.
    RegistryUnavailable,
}

/// A deterministic signer that records every request it receives.
pub struct NullSigner {
    honest: LocalSigner,
    impostor: LocalSigner,
    fault: Fault,
    requests: Mutex<Vec<SignatureRequest>>,
}

impl NullSigner {
    pub fn new(fault: Fault) -> Self {
        Self {
            honest: LocalSigner::from_master([0x42; 32]),
            impostor: LocalSigner::from_master([0x24; 32]),
            fault,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn honest() -> Self {
        Self::new(Fault::None)
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<SignatureRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn record(&self, request: &SignatureRequest) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
    }
}

impl KeyRegistry for NullSigner {
    fn make_commitment(&self, commitment: &Commitment) -> Result<BlsPublicKey, CollaboratorError> {
        if self.fault == Fault::RegistryUnavailable {
            return Err(CollaboratorError::Unavailable("null registry offline".into()));
        }
        self.impostor.make_commitment(commitment)?;
        self.honest.make_commitment(commitment)
    }
}

impl Signer for NullSigner {
    fn make_signature(&self, request: &SignatureRequest) -> Result<BlsSignature, CollaboratorError> {
        self.record(request);
        let round = request.round().get();

        match self.fault {
            Fault::Unavailable { from_round } if round >= from_round => {
                Err(CollaboratorError::Unavailable("null signer offline".into()))
            }
            Fault::WrongKey => self.impostor.make_signature(request),
            Fault::FlipBit { from_round } if round >= from_round => {
                let mut bytes = *self.honest.make_signature(request)?.as_bytes();
                bytes[BlsSignature::LEN - 1] ^= 0x01;
                Ok(BlsSignature::new(bytes))
            }
            Fault::Garbage { from_round } if round >= from_round => {
                Ok(BlsSignature::new([0xff; BlsSignature::LEN]))
            }
            _ => self.honest.make_signature(request),
        }
    }

    fn name(&self) -> &str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairchain_types::RoundIndex;

    fn request(commitment: Commitment, round: u64) -> SignatureRequest {
        SignatureRequest::Commitment {
            commitment,
            message: vec![round as u8],
            round: RoundIndex::new(round),
        }
    }

    #[test]
    fn records_requests() {
        let signer = NullSigner::honest();
        let commitment = Commitment::new([1; 32]);
        signer.make_commitment(&commitment).unwrap();
        signer.make_signature(&request(commitment, 1)).unwrap();
        signer.make_signature(&request(commitment, 2)).unwrap();
        let rounds: Vec<u64> = signer.requests().iter().map(|r| r.round().get()).collect();
        assert_eq!(rounds, vec![1, 2]);
    }

    #[test]
    fn unavailable_from_round() {
        let signer = NullSigner::new(Fault::Unavailable { from_round: 2 });
        let commitment = Commitment::new([1; 32]);
        signer.make_commitment(&commitment).unwrap();
        assert!(signer.make_signature(&request(commitment, 1)).is_ok());
        assert!(matches!(
            signer.make_signature(&request(commitment, 2)),
            Err(CollaboratorError::Unavailable(_))
        ));
    }

    #[test]
    fn registry_fault() {
        let signer = NullSigner::new(Fault::RegistryUnavailable);
        assert!(signer.make_commitment(&Commitment::new([1; 32])).is_err());
    }
}
