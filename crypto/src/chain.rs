//! SHA-256 hash chains for commit-then-reveal round seeds.
//!
//! A chain is *generated* forward from a secret root (`H(root)`, `H²(root)`,
//! …) but *played* backward: the last hash computed becomes the public
//! commitment, and every round reveals the preimage of the value revealed
//! before it. Only preimages are ever disclosed, so nobody can compute a
//! future seed from the ones already seen.

use std::collections::VecDeque;

use fairchain_types::{Commitment, Seed};
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::error::ChainError;
use crate::hash::sha256;

/// Builds hash chains from a random or caller-supplied root.
#[derive(Clone, Copy, Debug, Default)]
pub struct HashChainGenerator;

impl HashChainGenerator {
    /// Sample a fresh 32-byte root from `rng` and hash it forward `length` times.
    ///
    /// The root itself is not part of the chain and is wiped once the first
    /// link has been computed. A failing random source is fatal: a commitment
    /// built on weak entropy is worthless, so there is no retry.
    pub fn generate<R>(&self, rng: &mut R, length: usize) -> Result<GeneratedChain, ChainError>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        if length == 0 {
            return Err(ChainError::InvalidLength(length));
        }

        let mut root = [0u8; 32];
        rng.try_fill_bytes(&mut root)
            .map_err(|e| ChainError::RandomSourceFailure(e.to_string()))?;

        let chain = self.from_root(&Seed::new(root), length);
        root.zeroize();
        let chain = chain?;

        tracing::debug!(length, commitment = %chain.commitment(), "generated hash chain");
        Ok(chain)
    }

    /// Deterministically hash `root` forward `length` times.
    pub fn from_root(&self, root: &Seed, length: usize) -> Result<GeneratedChain, ChainError> {
        if length == 0 {
            return Err(ChainError::InvalidLength(length));
        }

        let mut seeds = Vec::with_capacity(length);
        let mut current = sha256(root.as_bytes());
        for _ in 0..length {
            seeds.push(Seed::new(current));
            current = sha256(&current);
        }
        Ok(GeneratedChain(seeds))
    }
}

/// A chain in generation order: element `i + 1` is the hash of element `i`.
///
/// Never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedChain(Vec<Seed>);

impl GeneratedChain {
    pub fn as_slice(&self) -> &[Seed] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The last hash computed, which becomes the commitment.
    pub fn commitment(&self) -> Commitment {
        // Non-empty by construction.
        Commitment::from(self.0[self.0.len() - 1])
    }

    /// Reverse into play order: index 0 is the commitment, the last index is
    /// the deepest preimage.
    pub fn into_play_order(self) -> HashChain {
        let commitment = self.commitment();
        let mut seeds = self.0;
        seeds.reverse();
        HashChain {
            commitment,
            remaining: seeds.into(),
        }
    }
}

/// A chain in play order, consumed one seed per round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashChain {
    commitment: Commitment,
    remaining: VecDeque<Seed>,
}

impl HashChain {
    /// Rebuild a play-order chain from seeds a player has collected.
    pub fn from_play_order(seeds: Vec<Seed>) -> Result<Self, ChainError> {
        let first = *seeds.first().ok_or(ChainError::InvalidLength(0))?;
        Ok(Self {
            commitment: Commitment::from(first),
            remaining: seeds.into(),
        })
    }

    /// The commitment this chain was published under. Stays fixed as the
    /// chain is consumed.
    pub fn commitment(&self) -> Commitment {
        self.commitment
    }

    /// Seeds not yet revealed.
    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    /// The seed the next `pop_next` would return.
    pub fn peek(&self) -> Option<&Seed> {
        self.remaining.front()
    }

    /// The seed after the next one, used as the HMAC input for a round.
    pub fn peek_second(&self) -> Option<&Seed> {
        self.remaining.get(1)
    }

    /// Reveal the head seed and advance the chain by one.
    pub fn pop_next(&mut self) -> Result<Seed, ChainError> {
        self.remaining.pop_front().ok_or(ChainError::ExhaustedChain)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Seed> {
        self.remaining.iter()
    }

    /// Reverse the remaining seeds back into generation order.
    pub fn into_generation_order(self) -> GeneratedChain {
        let mut seeds: Vec<Seed> = self.remaining.into();
        seeds.reverse();
        GeneratedChain(seeds)
    }
}

/// Returns true if `image == H(preimage)`.
pub fn verify_link(preimage: &Seed, image: &Seed) -> bool {
    sha256(preimage.as_bytes()) == *image.as_bytes()
}

/// Check a sequence of reveals against a commitment.
///
/// `reveals` are the seeds disclosed after the commitment, in play order:
/// `H(reveals[0]) == commitment` and `H(reveals[i]) == reveals[i - 1]`.
pub fn verify_reveals(commitment: &Commitment, reveals: &[Seed]) -> Result<(), ChainError> {
    let mut previous = commitment.as_seed();
    for (index, reveal) in reveals.iter().enumerate() {
        if !verify_link(reveal, &previous) {
            return Err(ChainError::BrokenLink { index });
        }
        previous = *reveal;
    }
    Ok(())
}
