//! Round numbering.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 1-based index of a round within one chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundIndex(u64);

impl RoundIndex {
    pub const FIRST: Self = Self(1);

    pub fn new(index: u64) -> Self {
        Self(index)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for RoundIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
