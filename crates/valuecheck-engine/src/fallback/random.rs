use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the jitter applied to synthetic figures.
///
/// Injected into the fallback generators so tests can pin results with a seed.
pub trait RandomSource: Send + Sync {
    /// Whole number in `min..=max`.
    fn between(&self, min: f64, max: f64) -> f64;
}

/// [`RandomSource`] backed by a `StdRng`.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    /// Reproducible sequence for a fixed seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Seeded when `seed` is given, otherwise from entropy.
    #[must_use]
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::from_seed)
    }
}

impl RandomSource for SeededRandom {
    fn between(&self, min: f64, max: f64) -> f64 {
        let (low, high) = if min <= max { (min, max) } else { (max, min) };
        if (high - low).abs() < f64::EPSILON {
            return low.round();
        }
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.random_range(low..=high).round()
    }
}
