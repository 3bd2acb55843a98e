//! Random source for revolt attempts.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DEFAULT_REVOLT_SUCCESS_PROBABILITY: f64 = 0.7;

/// Uniform success/failure draw. Implementations must honor the probability
/// exactly; tests substitute `FixedDice` to force an outcome.
pub trait Dice: Send {
    fn roll(&mut self, success_probability: f64) -> bool;
}

/// `StdRng`-backed dice, reproducible when built from a seed.
pub struct SeededDice {
    rng: StdRng,
}

impl SeededDice {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Dice for SeededDice {
    fn roll(&mut self, success_probability: f64) -> bool {
        self.rng.gen_bool(success_probability.clamp(0.0, 1.0))
    }
}

/// Always returns the same outcome.
#[derive(Debug, Clone, Copy)]
pub struct FixedDice(pub bool);

impl Dice for FixedDice {
    fn roll(&mut self, _success_probability: f64) -> bool {
        self.0
    }
}
