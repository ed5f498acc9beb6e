//! Random sources feeding the estimators.
//!
//! Every estimator takes its source as an explicit `&mut` handle, so two runs
//! driven by identically seeded sources produce bit-identical results. Any
//! [`rand::RngCore`] is a [`UnitSource`]; [`Replay`] plays back a fixed script.

use crate::{PiError, Result};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A stream of `f64` values, each uniform on the half-open interval `[0, 1)`.
pub trait UnitSource {
    fn next_unit(&mut self) -> f64;
}

impl<R: RngCore> UnitSource for R {
    fn next_unit(&mut self) -> f64 {
        // `Standard` for f64 samples [0, 1)
        self.gen::<f64>()
    }
}

/// Generator with a fixed seed. Same seed, same stream.
pub fn seeded(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Generator seeded from operating system entropy.
pub fn from_entropy() -> ChaCha8Rng {
    ChaCha8Rng::from_entropy()
}

/// Plays back a fixed sequence of unit values, wrapping around at the end.
#[derive(Debug, Clone)]
pub struct Replay {
    values: Vec<f64>,
    pos: usize,
}

impl Replay {
    /// Every value must lie in `[0, 1)` and the script must not be empty.
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(PiError::InvalidArgument("replay script is empty".into()));
        }
        if let Some(v) = values.iter().find(|v| !(0.0..1.0).contains(*v)) {
            return Err(PiError::InvalidArgument(format!(
                "replay value {} is outside [0, 1)",
                v
            )));
        }
        Ok(Self { values, pos: 0 })
    }

    /// Script from `(x, y)` points, drawn x first.
    pub fn from_points(points: &[(f64, f64)]) -> Result<Self> {
        Self::new(points.iter().flat_map(|&(x, y)| [x, y]).collect())
    }

    /// Values handed out so far.
    pub fn consumed(&self) -> usize {
        self.pos
    }
}

impl UnitSource for Replay {
    fn next_unit(&mut self) -> f64 {
        let v = self.values[self.pos % self.values.len()];
        self.pos += 1;
        v
    }
}
