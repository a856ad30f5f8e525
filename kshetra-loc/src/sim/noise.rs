//! Seeded noise source for the synthetic lidar.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Deterministic Gaussian and uniform noise.
#[derive(Clone, Debug)]
pub struct NoiseGenerator {
    rng: StdRng,
}

impl NoiseGenerator {
    /// Generator seeded with `seed`; equal seeds give equal sequences.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Zero-mean Gaussian sample with standard deviation `stddev`.
    #[inline]
    pub fn gaussian(&mut self, stddev: f32) -> f32 {
        if stddev == 0.0 {
            return 0.0;
        }
        let n: f32 = self.rng.sample(StandardNormal);
        n * stddev
    }

    /// Uniform sample in `[lo, hi)`; `lo` when the range is empty.
    #[inline]
    pub fn uniform(&mut self, lo: f32, hi: f32) -> f32 {
        if hi <= lo {
            return lo;
        }
        self.rng.random_range(lo..hi)
    }

    /// True with probability `p`.
    #[inline]
    pub fn chance(&mut self, p: f32) -> bool {
        p > 0.0 && self.uniform(0.0, 1.0) < p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_seed() {
        let mut a = NoiseGenerator::new(42);
        let mut b = NoiseGenerator::new(42);
        for _ in 0..100 {
            assert_eq!(a.gaussian(1.0), b.gaussian(1.0));
        }
    }

    #[test]
    fn test_zero_stddev() {
        let mut noise = NoiseGenerator::new(1);
        assert!((0..10).all(|_| noise.gaussian(0.0) == 0.0));
        assert!(!noise.chance(0.0));
    }

    #[test]
    fn test_uniform_in_range() {
        let mut noise = NoiseGenerator::new(3);
        for _ in 0..1000 {
            let u = noise.uniform(-2.0, 5.0);
            assert!((-2.0..5.0).contains(&u));
        }
        assert_eq!(noise.uniform(1.0, 1.0), 1.0);
    }
}
