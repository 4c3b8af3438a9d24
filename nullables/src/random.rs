//! Nullable random: deterministic and failing entropy sources.

use rand::{CryptoRng, RngCore};

/// A byte source that replays a fixed pattern forever.
///
/// Marked `CryptoRng` so it can stand in for the OS source; never use it
/// outside tests.
#[derive(Clone, Debug)]
pub struct NullRandom {
    pattern: Vec<u8>,
    position: usize,
}

impl NullRandom {
    /// Cycle through `pattern`. An empty pattern yields zeros.
    pub fn new(pattern: Vec<u8>) -> Self {
        Self {
            pattern,
            position: 0,
        }
    }

    /// Every byte is `value`.
    pub fn constant(value: u8) -> Self {
        Self::new(vec![value])
    }
}

impl RngCore for NullRandom {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.fill_bytes(&mut buf);
        u32::from_le_bytes(buf)
    }

    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.fill_bytes(&mut buf);
        u64::from_le_bytes(buf)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for byte in dest.iter_mut() {
            *byte = if self.pattern.is_empty() {
                0
            } else {
                self.pattern[self.position % self.pattern.len()]
            };
            self.position += 1;
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for NullRandom {}

/// A random source whose every read fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingRandom;

impl RngCore for FailingRandom {
    fn next_u32(&mut self) -> u32 {
        0
    }

    fn next_u64(&mut self) -> u64 {
        0
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(0);
    }

    fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
        Err(rand::Error::new("entropy source unavailable"))
    }
}

impl CryptoRng for FailingRandom {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_cycles() {
        let mut rng = NullRandom::new(vec![1, 2, 3]);
        let mut buf = [0u8; 7];
        rng.fill_bytes(&mut buf);
        assert_eq!(buf, [1, 2, 3, 1, 2, 3, 1]);
        assert_eq!(rng.next_u32().to_le_bytes(), [2, 3, 1, 2]);
    }

    #[test]
    fn empty_pattern_is_zero() {
        let mut rng = NullRandom::new(Vec::new());
        assert_eq!(rng.next_u64(), 0);
    }

    #[test]
    fn failing_random_errors() {
        let mut buf = [0u8; 32];
        assert!(FailingRandom.try_fill_bytes(&mut buf).is_err());
    }
}
