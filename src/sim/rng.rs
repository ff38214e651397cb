//! Injected randomness
//!
//! The spawner only ever asks for uniform draws, so tests can script the
//! exact sequence instead of searching for a seed that produces it.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Source of uniform draws in `[0, 1)`
pub trait RandomSource {
    fn next_unit(&mut self) -> f32;

    /// Uniform draw in `[lo, hi)`
    fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_unit()
    }
}

impl RandomSource for Pcg32 {
    fn next_unit(&mut self) -> f32 {
        self.random::<f32>()
    }
}

/// Seeded PCG generator for a run
pub fn seeded(seed: u64) -> Pcg32 {
    Pcg32::seed_from_u64(seed)
}

/// Replays a fixed list of draws, then repeats `fallback`
#[derive(Debug, Clone)]
pub struct ScriptedRng {
    draws: VecDeque<f32>,
    fallback: f32,
}

impl ScriptedRng {
    pub fn new(draws: impl IntoIterator<Item = f32>, fallback: f32) -> Self {
        Self {
            draws: draws.into_iter().collect(),
            fallback,
        }
    }

    /// Always returns the same value
    pub fn constant(value: f32) -> Self {
        Self::new([], value)
    }

    pub fn remaining(&self) -> usize {
        self.draws.len()
    }
}

impl RandomSource for ScriptedRng {
    fn next_unit(&mut self) -> f32 {
        self.draws.pop_front().unwrap_or(self.fallback)
    }
}
