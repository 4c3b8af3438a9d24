//! Hash-chain seeds and the commitment that fixes them.

/// A 32-byte round seed — one link of the hash chain.
///
/// Every seed except the deepest one is the SHA-256 image of the seed revealed
/// after it, so a revealed seed can be checked against the previous reveal.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Seed([u8; 32]);

fixed_bytes!(Seed, 32, "seed");

impl Seed {
    pub const ZERO: Self = Self([0u8; 32]);
}

impl Default for Seed {
    fn default() -> Self {
        Self::ZERO
    }
}

/// The published head of a hash chain.
///
/// Announced before the first round is played; fixes every later reveal
/// without disclosing any of them.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Commitment([u8; 32]);

fixed_bytes!(Commitment, 32, "commitment");

impl Commitment {
    /// The commitment viewed as the first seed of play order.
    pub fn as_seed(&self) -> Seed {
        Seed(self.0)
    }
}

impl From<Seed> for Commitment {
    fn from(seed: Seed) -> Self {
        Self(seed.0)
    }
}
