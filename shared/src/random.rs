//! Randomness used to pick winners.
//!
//! The selector only ever sees a [`SecureRandom`], so production code draws
//! from the operating system (or `crypto.getRandomValues` in the browser)
//! while tests and simulations plug in a seeded generator.

use rand::rngs::{OsRng, StdRng};
use rand::{CryptoRng, Rng, RngCore, SeedableRng};

/// A cryptographically strong generator the selector can draw from.
pub trait SecureRandom: RngCore + CryptoRng {
    /// Unbiased integer in `[0, bound)`.
    ///
    /// Draws that land in the incomplete tail of the `u64` range are thrown
    /// away and redrawn, so every residue is equally likely. A bound of zero
    /// yields zero.
    fn uniform_below(&mut self, bound: u64) -> u64 {
        if bound <= 1 {
            return 0;
        }
        // 2^64 mod bound
        let tail = (u64::MAX % bound + 1) % bound;
        let limit = u64::MAX - tail;
        loop {
            let value = self.next_u64();
            if value <= limit {
                return value % bound;
            }
        }
    }

    /// Uniform fraction in `[0, 1)`.
    fn unit_fraction(&mut self) -> f64 {
        self.gen()
    }
}

/// Operating-system CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RngCore for OsRandom {
    fn next_u32(&mut self) -> u32 {
        OsRng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        OsRng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        OsRng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        OsRng.try_fill_bytes(dest)
    }
}

impl CryptoRng for OsRandom {}
impl SecureRandom for OsRandom {}

/// Reproducible generator for tests, simulations and replays.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    inner: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }
}

impl RngCore for SeededRandom {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

impl CryptoRng for SeededRandom {}
impl SecureRandom for SeededRandom {}
