use crate::estimator::estimate_pi;
use crate::quadrature::{partition, trapezoid_pi, Segment};
use crate::shard::estimate_pi_sharded;
use crate::source;
use crate::timing::{timed, Timed};
use crate::{PiError, Result};
use clap::ValueEnum;
use log::info;
use rand::Rng;
use rayon::prelude::*;

/// Trials (or quadrature steps) used when none are given.
pub const DEFAULT_SAMPLES: u64 = 20_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Method {
    /// Random sampling of the unit square.
    #[default]
    MonteCarlo,
    /// Trapezoid rule on 4 / (1 + x^2).
    Trapezoid,
}

/// One estimation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub samples: u64,
    pub workers: usize,
    pub method: Method,
    /// Fixed seed for reproducible Monte Carlo runs; entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            samples: DEFAULT_SAMPLES,
            workers: 1,
            method: Method::default(),
            seed: None,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.samples == 0 {
            return Err(PiError::InvalidArgument(
                "number of samples must be positive".into(),
            ));
        }
        if self.workers == 0 {
            return Err(PiError::InvalidArgument(
                "number of workers must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Validates, then times the estimate. Generator setup is outside the
    /// timed region.
    pub fn run(&self) -> Result<Timed<f64>> {
        self.validate()?;
        info!(
            "Estimating pi with {:?}: {} samples on {} workers",
            self.method, self.samples, self.workers
        );

        match (self.method, self.workers) {
            (Method::MonteCarlo, 1) => {
                let mut rng = match self.seed {
                    Some(seed) => source::seeded(seed),
                    None => source::from_entropy(),
                };
                timed(|| estimate_pi(self.samples, &mut rng)).transpose()
            }
            (Method::MonteCarlo, workers) => {
                let seed = self.seed.unwrap_or_else(|| source::from_entropy().gen());
                timed(|| estimate_pi_sharded(self.samples, workers, seed)).transpose()
            }
            (Method::Trapezoid, 1) => timed(|| trapezoid_pi(self.samples)).transpose(),
            (Method::Trapezoid, workers) => {
                let segments = (0..workers)
                    .map(|rank| partition(self.samples, rank, workers))
                    .collect::<Result<Vec<Segment>>>()?;
                Ok(timed(|| segments.par_iter().map(Segment::integrate).sum::<f64>()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn defaults_match_reference_run() {
        let s = Settings::default();
        assert_eq!(s.samples, 20_000_000);
        assert_eq!(s.workers, 1);
        assert_eq!(s.method, Method::MonteCarlo);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn zero_samples_or_workers_rejected() {
        let s = Settings { samples: 0, ..Settings::default() };
        assert!(matches!(s.run(), Err(PiError::InvalidArgument(_))));
        let s = Settings { workers: 0, ..Settings::default() };
        assert!(matches!(s.run(), Err(PiError::InvalidArgument(_))));
    }

    #[test]
    fn seeded_runs_repeat() {
        for workers in [1, 3] {
            let s = Settings {
                samples: 50_000,
                workers,
                seed: Some(11),
                ..Settings::default()
            };
            let a = s.run().unwrap().value;
            let b = s.run().unwrap().value;
            assert_eq!(a.to_bits(), b.to_bits());
            assert!((0.0..=4.0).contains(&a));
        }
    }

    #[test]
    fn trapezoid_with_workers_matches_serial() {
        let serial = Settings {
            samples: 10_000,
            method: Method::Trapezoid,
            ..Settings::default()
        };
        let parallel = Settings { workers: 4, ..serial.clone() };
        let a = serial.run().unwrap().value;
        let b = parallel.run().unwrap().value;
        assert!((a - b).abs() < 1e-12);
        assert!((a - PI).abs() < 1e-8);
    }
}
