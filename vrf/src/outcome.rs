//! Turning a verified round signature into a crash multiplier.
//!
//! The signature is first folded into a 32-byte digest (either a plain SHA-256
//! of the signature, or an HMAC keyed by the signature over the next chain
//! seed). The top [`N_BITS`] of that digest give an integer `r`, and
//! `X = r / 2^52` is uniform over `[0, 1)`. The multiplier is `1 / (1 - X)`
//! (or `1 / X` for the dice variant), optionally reduced by a house edge.

use fairchain_crypto::{hmac_sha256, sha256};
use fairchain_types::{BlsSignature, Seed};
use serde::{Deserialize, Serialize};

use crate::error::OutcomeError;

/// Bits of the digest used for `r`: more than an `f64` mantissa holds, well
/// under the digest width.
pub const N_BITS: u32 = 52;

/// `2^52`, the largest multiplier either formula reaches before the boundary.
pub const MAX_MULTIPLIER: f64 = (1u64 << N_BITS) as f64;

const MAX_R: u64 = (1u64 << N_BITS) - 1;

/// Upper bound on re-hashes under [`BoundaryPolicy::Resample`].
const MAX_RESAMPLES: usize = 16;

/// How the round digest is bound to the signature.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DerivationMode {
    /// `HMAC-SHA256(key = signature, message = next seed)`.
    #[default]
    HmacWithNextSeed,
    /// `SHA-256(signature)`.
    HashOfSignature,
}

impl DerivationMode {
    /// Seeds a single round consumes from the chain: the HMAC mode also needs
    /// a peek at the seed after it.
    pub fn seeds_per_round(self) -> usize {
        match self {
            DerivationMode::HmacWithNextSeed => 2,
            DerivationMode::HashOfSignature => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MultiplierFormula {
    /// `1 / (1 - X)`: the classic crash curve.
    #[default]
    InverseComplement,
    /// `1 / X`: the crash-dice variant.
    Inverse,
}

/// What to do when `r` lands on the value that would divide by zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoundaryPolicy {
    /// Report [`MAX_MULTIPLIER`].
    #[default]
    Clamp,
    /// Re-hash the digest with SHA-256 until `r` leaves the boundary.
    Resample,
}

/// Outcome derivation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutcomeConfig {
    #[serde(default)]
    pub derivation: DerivationMode,

    #[serde(default)]
    pub formula: MultiplierFormula,

    #[serde(default)]
    pub boundary: BoundaryPolicy,

    /// Fraction kept by the house, in `[0, 1)`.
    #[serde(default)]
    pub house_edge: f64,

    /// Floor the multiplier to two decimals.
    #[serde(default)]
    pub floor_to_cents: bool,
}

impl Default for OutcomeConfig {
    fn default() -> Self {
        Self {
            derivation: DerivationMode::default(),
            formula: MultiplierFormula::default(),
            boundary: BoundaryPolicy::default(),
            house_edge: 0.0,
            floor_to_cents: false,
        }
    }
}

/// A derived round result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Outcome {
    /// `X`, uniform over `[0, 1)`.
    pub uniform: f64,
    pub multiplier: f64,
    /// Set when the boundary policy had to intervene.
    pub boundary_hit: bool,
}

/// Deterministic signature → multiplier mapping.
#[derive(Clone, Debug)]
pub struct OutcomeDeriver {
    config: OutcomeConfig,
}

impl OutcomeDeriver {
    pub fn new(config: OutcomeConfig) -> Result<Self, OutcomeError> {
        if !(0.0..1.0).contains(&config.house_edge) {
            return Err(OutcomeError::InvalidHouseEdge(config.house_edge));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &OutcomeConfig {
        &self.config
    }

    /// The 32-byte digest bound to `signature`.
    pub fn digest(
        &self,
        signature: &BlsSignature,
        next_seed: Option<&Seed>,
    ) -> Result<[u8; 32], OutcomeError> {
        match self.config.derivation {
            DerivationMode::HashOfSignature => Ok(sha256(signature.as_bytes())),
            DerivationMode::HmacWithNextSeed => {
                let next = next_seed.ok_or(OutcomeError::MissingNextSeed)?;
                Ok(hmac_sha256(signature.as_bytes(), next.as_bytes()))
            }
        }
    }

    /// Derive the round outcome from a verified signature.
    pub fn derive(
        &self,
        signature: &BlsSignature,
        next_seed: Option<&Seed>,
    ) -> Result<Outcome, OutcomeError> {
        let digest = self.digest(signature, next_seed)?;
        self.from_digest(digest)
    }

    /// Map a raw digest to an outcome, applying the boundary policy.
    pub fn from_digest(&self, digest: [u8; 32]) -> Result<Outcome, OutcomeError> {
        let mut digest = digest;
        let mut r = top_bits(&digest);

        if !self.on_boundary(r) {
            return Ok(self.finish(r, self.raw_multiplier(r), false));
        }

        match self.config.boundary {
            BoundaryPolicy::Clamp => {
                tracing::warn!(r, "outcome on boundary, clamping multiplier");
                Ok(self.finish(r, MAX_MULTIPLIER, true))
            }
            BoundaryPolicy::Resample => {
                for _ in 0..MAX_RESAMPLES {
                    digest = sha256(&digest);
                    r = top_bits(&digest);
                    if !self.on_boundary(r) {
                        tracing::warn!(r, "outcome on boundary, resampled digest");
                        return Ok(self.finish(r, self.raw_multiplier(r), true));
                    }
                }
                Err(OutcomeError::BoundaryUnresolved(MAX_RESAMPLES))
            }
        }
    }

    fn on_boundary(&self, r: u64) -> bool {
        match self.config.formula {
            MultiplierFormula::InverseComplement => r == MAX_R,
            MultiplierFormula::Inverse => r == 0,
        }
    }

    fn raw_multiplier(&self, r: u64) -> f64 {
        let x = r as f64 / MAX_MULTIPLIER;
        match self.config.formula {
            MultiplierFormula::InverseComplement => 1.0 / (1.0 - x),
            MultiplierFormula::Inverse => 1.0 / x,
        }
    }

    fn finish(&self, r: u64, raw: f64, boundary_hit: bool) -> Outcome {
        let mut multiplier = raw * (1.0 - self.config.house_edge);
        if self.config.floor_to_cents {
            multiplier = (multiplier * 100.0).floor() / 100.0;
        }
        Outcome {
            uniform: r as f64 / MAX_MULTIPLIER,
            multiplier: multiplier.max(1.0),
            boundary_hit,
        }
    }
}

/// The top [`N_BITS`] of `digest`, big-endian.
pub fn top_bits(digest: &[u8; 32]) -> u64 {
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head) >> (64 - N_BITS)
}

/// `X = r / 2^52`, uniform over `[0, 1)` for a uniform digest.
pub fn uniform(digest: &[u8; 32]) -> f64 {
    top_bits(digest) as f64 / MAX_MULTIPLIER
}
