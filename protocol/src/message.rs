//! Round message construction for the two signer request shapes.

use fairchain_crypto::hmac_sha256;
use fairchain_types::{Commitment, RoundIndex, Seed};
use serde::{Deserialize, Serialize};

use crate::collaborator::SignatureRequest;
use crate::error::ProtocolError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageShape {
    /// Sign `seed || client_seed` under the chain commitment.
    #[default]
    Commitment,
    /// Sign `HMAC(seed, "client_seed:round")` under the seed hash.
    Contribution,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageConfig {
    #[serde(default)]
    pub shape: MessageShape,

    /// Player-chosen seed mixed into every round message. Treated as UTF-8.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_seed: Option<String>,
}

impl MessageConfig {
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.shape == MessageShape::Contribution && self.client_seed.is_none() {
            return Err(ProtocolError::Config(
                "contribution messages require a client_seed".into(),
            ));
        }
        Ok(())
    }

    /// Build the signer request for the round revealing `seed`.
    pub fn request(
        &self,
        commitment: &Commitment,
        seed: &Seed,
        round: RoundIndex,
    ) -> Result<SignatureRequest, ProtocolError> {
        match self.shape {
            MessageShape::Commitment => {
                let mut message = seed.as_bytes().to_vec();
                if let Some(client_seed) = &self.client_seed {
                    message.extend_from_slice(client_seed.as_bytes());
                }
                Ok(SignatureRequest::Commitment {
                    commitment: *commitment,
                    message,
                    round,
                })
            }
            MessageShape::Contribution => {
                let client_seed = self.client_seed.as_deref().ok_or_else(|| {
                    ProtocolError::Config("contribution messages require a client_seed".into())
                })?;
                Ok(SignatureRequest::Contribution {
                    seed_hash: *commitment,
                    contribution: contribution(seed, client_seed, round),
                    round,
                })
            }
        }
    }
}

/// The game server's per-round contribution: `HMAC-SHA256(seed, "client_seed:round")`.
///
/// Being inside an HMAC, the ad-hoc `:` framing is not open to extension tricks.
pub fn contribution(seed: &Seed, client_seed: &str, round: RoundIndex) -> [u8; 32] {
    hmac_sha256(
        seed.as_bytes(),
        format!("{client_seed}:{}", round.get()).as_bytes(),
    )
}
