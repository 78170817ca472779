/*
 * Random Source Module
 *
 * The world never touches a global generator. It is handed a RandomSource at
 * construction and draws from it in a fixed order (population draws, then one
 * Brownian draw per axis per agent per step), so equal seeds replay equal runs.
 */

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub trait RandomSource {
    /// Uniform sample in [0, 1)
    fn next(&mut self) -> f64;

    /// Uniform integer in [min, max). Returns `min` when the range is empty.
    fn next_int(&mut self, min: i64, max: i64) -> i64;
}

/// ChaCha8-backed source. The stream is stable across platforms and rand
/// versions, which `StdRng` does not promise.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    seed: u64,
    rng: ChaCha8Rng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SeededRandom {
    fn next(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn next_int(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..max)
    }
}
