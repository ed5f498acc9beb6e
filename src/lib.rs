//! Estimators of π for parallel computing exercises.
//!
//! The core is a Monte Carlo estimator: draw uniform points in the unit square
//! and count how many land inside the unit quarter-circle. Around it sit a wall
//! clock timing wrapper, a sharded variant that splits the trial budget across
//! worker threads, a deterministic trapezoid-rule estimator, and a small
//! shared memory process group for running the same estimate across processes.
//!
//! # Features
//!
//! - **Serial estimation**: [`estimate_pi`] with an explicitly passed random source
//! - **Sharded estimation**: [`shard::estimate_pi_sharded`] on the rayon pool
//! - **Quadrature**: [`quadrature::trapezoid_pi`] and per-rank [`quadrature::partition`]
//! - **Process groups**: [`group::ProcessGroup`] with rank, size, processor name and collectives
//! - **Group estimators**: [`distributed`] runs both estimators across a process group
//!
//! # Quick Start
//!
//! ```rust
//! use simple_pi::{estimate_pi, source, timing::timed};
//!
//! let mut rng = source::seeded(2024);
//! let run = timed(|| estimate_pi(1_000_000, &mut rng)).transpose().unwrap();
//! println!("{}", run);
//! assert!((run.value - std::f64::consts::PI).abs() < 0.01);
//! ```
//!
//! # Error Handling
//!
//! Fallible operations return [`Result`] with variants of [`PiError`]. A
//! non-positive trial count is [`PiError::InvalidArgument`], never a division
//! by zero.

pub mod config;
pub mod distributed;
pub mod error;
pub mod estimator;
pub mod group;
pub mod quadrature;
pub mod shard;
pub mod source;
pub mod timing;

pub use error::{PiError, Result};
pub use estimator::{count_hits, estimate_pi, HitTally, Trial};
pub use source::UnitSource;
