//! Serial Monte Carlo estimation of π.
//!
//! Points are drawn uniformly from the unit square `[0, 1) x [0, 1)`. The
//! fraction landing strictly inside the unit quarter-circle approaches π/4,
//! so `4 * hits / samples` approaches π with error shrinking as `1/sqrt(n)`.

use crate::source::UnitSource;
use crate::{PiError, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// One sampled point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trial {
    pub x: f64,
    pub y: f64,
}

impl Trial {
    /// Draws `x` then `y` from `source`.
    pub fn draw<S: UnitSource + ?Sized>(source: &mut S) -> Self {
        let x = source.next_unit();
        let y = source.next_unit();
        Trial { x, y }
    }

    /// Strictly inside the unit circle; boundary points are misses.
    pub fn is_hit(&self) -> bool {
        self.x * self.x + self.y * self.y < 1.0
    }
}

/// Hits out of samples for one run or shard.
///
/// Merging is an associative, commutative sum with [`HitTally::default`] as
/// identity, so partial tallies can be combined in any order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitTally {
    pub hits: u64,
    pub samples: u64,
}

impl HitTally {
    pub fn merge(self, other: HitTally) -> HitTally {
        HitTally {
            hits: self.hits + other.hits,
            samples: self.samples + other.samples,
        }
    }

    /// `4 * hits / samples`. Fails on an empty tally instead of yielding NaN.
    pub fn estimate(&self) -> Result<f64> {
        if self.samples == 0 {
            return Err(PiError::InvalidArgument(
                "cannot estimate from zero samples".into(),
            ));
        }
        Ok(4.0 * self.hits as f64 / self.samples as f64)
    }
}

/// Runs `n` trials and counts the hits. `n == 0` is allowed and yields 0.
pub fn count_hits<S: UnitSource + ?Sized>(n: u64, source: &mut S) -> u64 {
    let mut hits = 0u64;
    for _ in 0..n {
        if Trial::draw(source).is_hit() {
            hits += 1;
        }
    }
    hits
}

/// Runs `n` trials and returns their tally.
pub fn sample<S: UnitSource + ?Sized>(n: u64, source: &mut S) -> HitTally {
    HitTally {
        hits: count_hits(n, source),
        samples: n,
    }
}

/// Estimates π from `n` trials drawn from `source`.
///
/// The result always lies in `[0.0, 4.0]`.
///
/// # Errors
///
/// [`PiError::InvalidArgument`] when `n` is zero.
///
/// # Examples
///
/// ```rust
/// use simple_pi::{estimate_pi, source};
///
/// let mut rng = source::seeded(1);
/// let pi = estimate_pi(100_000, &mut rng).unwrap();
/// assert!((pi - std::f64::consts::PI).abs() < 0.05);
/// ```
pub fn estimate_pi<S: UnitSource + ?Sized>(n: u64, source: &mut S) -> Result<f64> {
    if n == 0 {
        return Err(PiError::InvalidArgument(
            "number of trials must be positive".into(),
        ));
    }
    let tally = sample(n, source);
    debug!("{} hits out of {} trials", tally.hits, tally.samples);
    tally.estimate()
}
