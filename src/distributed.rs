//! Estimators spread over a [`ProcessGroup`].
//!
//! Every rank calls the same function; rank 0 receives the combined result
//! and every other rank gets `None`.

use crate::estimator::HitTally;
use crate::group::ProcessGroup;
use crate::quadrature::partition;
use crate::shard::{sample_shard, ShardPlan};
use crate::source;
use crate::Result;
use log::debug;
use rand::Rng;

const PARTIAL_SUM_TAG: i32 = 0;

/// The hello world line for this rank.
pub fn greeting(group: &ProcessGroup) -> String {
    let word = if group.rank() == 0 { "Hello" } else { "Goodbye" };
    format!(
        "{} world from processor {}, rank {} out of {} processors",
        word,
        group.processor_name(),
        group.rank(),
        group.size()
    )
}

/// Trapezoid π summed twice: once by point-to-point messages to rank 0, once
/// by a gather. Both should agree up to rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrapezoidSums {
    pub point_to_point: f64,
    pub gathered: f64,
}

/// Each rank integrates its [`partition`] of `steps`.
pub fn trapezoid_pi_group(group: &ProcessGroup, steps: u64) -> Result<Option<TrapezoidSums>> {
    let segment = partition(steps, group.rank(), group.size())?;
    let local = segment.integrate();
    debug!(
        "Rank {} integrated [{}, {}] in {} steps: {}",
        group.rank(),
        segment.a,
        segment.b,
        segment.steps,
        local
    );

    let point_to_point = if group.rank() == 0 {
        let mut total = local;
        for rank in 1..group.size() {
            total += group.recv::<f64>(rank, PARTIAL_SUM_TAG)?;
        }
        Some(total)
    } else {
        group.send(&local, 0, PARTIAL_SUM_TAG)?;
        None
    };

    let gathered = group.gather(&local, 0)?.map(|parts| parts.iter().sum::<f64>());

    Ok(point_to_point
        .zip(gathered)
        .map(|(point_to_point, gathered)| TrapezoidSums { point_to_point, gathered }))
}

/// Monte Carlo π over the group.
///
/// Rank 0 plans the shards of `n` trials and scatters the sizes, then
/// broadcasts a seed (from entropy unless given). Each rank samples its own
/// stream and the tallies are summed on rank 0.
pub fn monte_carlo_pi_group(group: &ProcessGroup, n: u64, seed: Option<u64>) -> Result<Option<HitTally>> {
    let sizes = if group.rank() == 0 {
        Some(ShardPlan::new(n, group.size())?.sizes().to_vec())
    } else {
        None
    };
    let share: u64 = group.scatter(sizes.as_deref(), 0)?;

    let seed = if group.rank() == 0 {
        seed.unwrap_or_else(|| source::from_entropy().gen())
    } else {
        0
    };
    let seed = group.broadcast(&seed, 0)?;

    let local = sample_shard(group.rank(), share, seed);
    group.reduce_sum(local, 0)
}
