//! Deterministic pseudo-random numbers for simulation logic.
//!
//! Any randomness that influences simulation state (spawn positions, loot
//! rolls, AI jitter) must come from a [`DeterministicRng`] passed in
//! explicitly, never from a global or OS-seeded source. Two generators built
//! from the same seed produce the same sequence on every machine.

use bevy::prelude::*;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::sim::fixed_math::FixedNum;

/// Numerical Recipes LCG multiplier.
const LCG_A: u32 = 1_664_525;
/// Numerical Recipes LCG increment.
const LCG_C: u32 = 1_013_904_223;

/// Linear congruential generator: `state = a * state + c (mod 2^32)`.
#[derive(Resource, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterministicRng {
    seed: u32,
    state: u32,
}

impl DeterministicRng {
    pub fn new(seed: u32) -> Self {
        Self { seed, state: seed }
    }

    /// Seed this generator was created (or last reseeded) with.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Current internal state, for snapshotting alongside simulation state.
    pub fn state(&self) -> u32 {
        self.state
    }

    /// Restore a state previously read with [`state`](Self::state).
    pub fn set_state(&mut self, state: u32) {
        self.state = state;
    }

    pub fn reseed(&mut self, seed: u32) {
        self.seed = seed;
        self.state = seed;
    }

    #[inline]
    fn advance(&mut self) -> u32 {
        self.state = LCG_A.wrapping_mul(self.state).wrapping_add(LCG_C);
        self.state
    }

    /// Next value in `[0, 2^31)`: the upper 31 bits of the new state.
    #[inline]
    pub fn next_int(&mut self) -> u32 {
        self.advance() >> 1
    }

    /// Uniform-ish integer in `[min, max)`. Returns `min` when the range is empty.
    pub fn next_int_range(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (max as i64 - min as i64) as u64;
        let offset = self.next_int() as u64 % span;
        (min as i64 + offset as i64) as i32
    }

    /// Fixed-point value in `[0, 1)` built from the top 16 of the 31 output bits.
    pub fn next_fixed(&mut self) -> FixedNum {
        FixedNum::from_bits((self.next_int() >> 15) as i32)
    }

    /// Fixed-point value in `[min, max)`.
    pub fn next_fixed_range(&mut self, min: FixedNum, max: FixedNum) -> FixedNum {
        min + (max - min) * self.next_fixed()
    }

    pub fn next_bool(&mut self) -> bool {
        self.next_int() >= (1 << 30)
    }

    /// True with probability `p` (clamped to [0, 1]).
    pub fn chance(&mut self, p: FixedNum) -> bool {
        self.next_fixed() < p.clamp(FixedNum::ZERO, FixedNum::ONE)
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.next_int_range(0, items.len() as i32) as usize;
        items.get(idx)
    }

    /// Fisher-Yates shuffle. The swap index for position `i` is
    /// `next_int_range(0, i + 1)`; changing that formula changes every
    /// permutation produced for a given seed.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_int_range(0, i as i32 + 1) as usize;
            items.swap(i, j);
        }
    }
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Lets `rand` helpers draw from the same deterministic stream.
impl RngCore for DeterministicRng {
    fn next_u32(&mut self) -> u32 {
        self.advance()
    }

    fn next_u64(&mut self) -> u64 {
        let hi = self.advance() as u64;
        let lo = self.advance() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(4) {
            let bytes = self.advance().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

impl SeedableRng for DeterministicRng {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}
