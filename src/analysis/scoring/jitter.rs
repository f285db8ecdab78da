use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the integer offsets that exercise scorers add to base scores.
///
/// A disabled jitter always yields 0, which makes exercise scores exact.
#[derive(Debug, Clone)]
pub struct Jitter {
    rng: Option<StdRng>,
}

impl Jitter {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Some(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Some(StdRng::from_entropy()),
        }
    }

    pub fn none() -> Self {
        Self { rng: None }
    }

    /// Uniform draw from `range`, or 0 when disabled.
    pub fn offset(&mut self, range: RangeInclusive<i32>) -> i32 {
        match self.rng.as_mut() {
            Some(rng) => rng.gen_range(range),
            None => 0,
        }
    }
}
