//! Deterministic π by the trapezoid rule.
//!
//! π = ∫₀¹ 4 / (1 + x²) dx. Splitting the step range across ranks with
//! [`partition`] and summing the local integrals gives the same value as a
//! single pass, up to rounding.

use crate::{PiError, Result};

/// The integrand whose integral over `[0, 1]` is π.
pub fn integrand(x: f64) -> f64 {
    4.0 / (1.0 + x * x)
}

/// Trapezoid sum of `f` over `steps` intervals of width `h` starting at `a`,
/// ending at `b`.
pub fn trapezoid<F: Fn(f64) -> f64>(f: F, a: f64, b: f64, steps: u64, h: f64) -> f64 {
    let mut estimate = (f(a) + f(b)) / 2.0;
    for i in 1..steps {
        estimate += f(a + i as f64 * h);
    }
    estimate * h
}

/// π with `steps` intervals over `[0, 1]`.
pub fn trapezoid_pi(steps: u64) -> Result<f64> {
    if steps == 0 {
        return Err(PiError::InvalidArgument(
            "number of steps must be positive".into(),
        ));
    }
    let h = 1.0 / steps as f64;
    Ok(trapezoid(integrand, 0.0, 1.0, steps, h))
}

/// One rank's share of a trapezoid integration over `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub a: f64,
    pub b: f64,
    pub steps: u64,
    pub h: f64,
}

impl Segment {
    pub fn integrate(&self) -> f64 {
        if self.steps == 0 {
            return 0.0;
        }
        trapezoid(integrand, self.a, self.b, self.steps, self.h)
    }
}

/// Splits `steps` intervals over `size` ranks. The first `steps % size` ranks
/// take one extra interval so the segments tile `[0, 1]` exactly.
pub fn partition(steps: u64, rank: usize, size: usize) -> Result<Segment> {
    if steps == 0 || size == 0 {
        return Err(PiError::InvalidArgument(
            "steps and size must be positive".into(),
        ));
    }
    if rank >= size {
        return Err(PiError::InvalidRank(rank));
    }
    let h = 1.0 / steps as f64;
    let (size, rank) = (size as u64, rank as u64);
    let (base, extra) = (steps / size, steps % size);
    let local = base + u64::from(rank < extra);
    let first = rank * base + rank.min(extra);
    let a = first as f64 * h;
    let b = (first + local) as f64 * h;
    Ok(Segment { a, b, steps: local, h })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn converges_to_pi() {
        assert!((trapezoid_pi(1_000_000).unwrap() - PI).abs() < 1e-9);
        assert!((trapezoid_pi(1).unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn zero_steps_is_invalid() {
        assert!(matches!(trapezoid_pi(0), Err(PiError::InvalidArgument(_))));
    }

    #[test]
    fn partitions_tile_the_interval() {
        let steps = 1003;
        let size = 4;
        let segments: Vec<Segment> = (0..size)
            .map(|r| partition(steps, r, size).unwrap())
            .collect();
        assert_eq!(segments[0].a, 0.0);
        assert!((segments[size - 1].b - 1.0).abs() < 1e-12);
        assert_eq!(segments.iter().map(|s| s.steps).sum::<u64>(), steps);
        for pair in segments.windows(2) {
            assert_eq!(pair[0].b, pair[1].a);
        }

        let total: f64 = segments.iter().map(Segment::integrate).sum();
        assert!((total - trapezoid_pi(steps).unwrap()).abs() < 1e-12);
    }

    #[test]
    fn partition_rejects_bad_rank() {
        assert!(matches!(partition(10, 3, 3), Err(PiError::InvalidRank(3))));
    }
}
