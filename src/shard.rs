//! Splitting a trial budget across workers.
//!
//! Each shard runs on the rayon pool with its own ChaCha stream derived from a
//! common seed, and the shard tallies are summed. Integer sums do not care
//! about completion order, so a given `(n, p, seed)` always yields the same
//! estimate.

use crate::estimator::{sample, HitTally};
use crate::source::seeded;
use crate::{PiError, Result};
use log::{debug, warn};
use rayon::prelude::*;

/// Trial counts per shard. Sizes sum to `n` and differ by at most one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardPlan {
    sizes: Vec<u64>,
}

impl ShardPlan {
    pub fn new(n: u64, shards: usize) -> Result<Self> {
        if n == 0 {
            return Err(PiError::InvalidArgument(
                "number of trials must be positive".into(),
            ));
        }
        if shards == 0 {
            return Err(PiError::InvalidArgument(
                "number of workers must be positive".into(),
            ));
        }

        let p = shards as u64;
        let (base, extra) = (n / p, n % p);
        if extra != 0 {
            warn!("n={} is not evenly divisible by p={}", n, p);
        }
        let sizes = (0..p).map(|i| base + u64::from(i < extra)).collect();
        Ok(Self { sizes })
    }

    pub fn sizes(&self) -> &[u64] {
        &self.sizes
    }

    pub fn total(&self) -> u64 {
        self.sizes.iter().sum()
    }
}

/// Runs shard `index` of `size` trials on its own stream of `seed`.
pub fn sample_shard(index: usize, size: u64, seed: u64) -> HitTally {
    let mut rng = seeded(seed);
    rng.set_stream(index as u64);
    let tally = sample(size, &mut rng);
    debug!("Shard {} finished: {} hits of {}", index, tally.hits, tally.samples);
    tally
}

/// Runs every shard of `plan` in parallel and sums their tallies.
pub fn sample_sharded(plan: &ShardPlan, seed: u64) -> HitTally {
    plan.sizes()
        .par_iter()
        .enumerate()
        .map(|(index, &size)| sample_shard(index, size, seed))
        .reduce(HitTally::default, HitTally::merge)
}

/// Estimates π from `n` trials split over `shards` workers.
pub fn estimate_pi_sharded(n: u64, shards: usize, seed: u64) -> Result<f64> {
    let plan = ShardPlan::new(n, shards)?;
    debug!("Sharding {} trials as {:?}", n, plan.sizes());
    sample_sharded(&plan, seed).estimate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_spreads_remainder() {
        let plan = ShardPlan::new(10, 4).unwrap();
        assert_eq!(plan.sizes(), &[3, 3, 2, 2]);
        assert_eq!(plan.total(), 10);
    }

    #[test]
    fn plan_with_more_workers_than_trials() {
        let plan = ShardPlan::new(2, 5).unwrap();
        assert_eq!(plan.sizes(), &[1, 1, 0, 0, 0]);
    }

    #[test]
    fn plan_rejects_zero() {
        assert!(matches!(ShardPlan::new(0, 4), Err(PiError::InvalidArgument(_))));
        assert!(matches!(ShardPlan::new(4, 0), Err(PiError::InvalidArgument(_))));
    }

    #[test]
    fn sharded_run_matches_any_reduction_order() {
        let plan = ShardPlan::new(40_001, 7).unwrap();
        let parallel = sample_sharded(&plan, 99);
        let reversed = plan
            .sizes()
            .iter()
            .enumerate()
            .rev()
            .map(|(i, &size)| sample_shard(i, size, 99))
            .fold(HitTally::default(), HitTally::merge);
        assert_eq!(parallel, reversed);
        assert_eq!(parallel.samples, 40_001);
    }

    #[test]
    fn sharded_estimate_is_deterministic_per_seed() {
        let a = estimate_pi_sharded(100_000, 4, 5).unwrap();
        let b = estimate_pi_sharded(100_000, 4, 5).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
        assert!((a - std::f64::consts::PI).abs() < 0.05);
    }
}
