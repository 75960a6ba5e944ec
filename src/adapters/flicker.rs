//! PRNG-backed flicker source for the power-issue simulation.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::app::ports::FlickerSource;

/// Duty levels a flickering supply lands on.
pub const FLICKER_LEVELS: [u8; 3] = [0, 50, 100];

/// Picks uniformly from [`FLICKER_LEVELS`].
pub struct RandomFlicker {
    rng: StdRng,
}

impl RandomFlicker {
    /// Seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomFlicker {
    fn default() -> Self {
        Self::new()
    }
}

impl FlickerSource for RandomFlicker {
    fn next_duty(&mut self) -> u8 {
        FLICKER_LEVELS.choose(&mut self.rng).copied().unwrap_or(0)
    }
}
