//! # hsmm-duration
//!
//! A Poisson state-duration model for hidden semi-Markov models, with Gamma-conjugate
//! posterior updates of the per-state rates for use inside a Gibbs sampler.
//!
//! - [`duration::PoissonDuration`]: the model (likelihood, sampling, support).
//! - [`stats::run_lengths`]: run-length extraction from labelled sequences.
//! - [`core`]: the [`core::DurationModel`] trait and helpers to run repeated updates.
//! - [`observer`]: diagnostics hooks, forwarded to `log` by default.

pub mod config;
pub mod core;
pub mod distributions;
pub mod duration;
pub mod error;
pub mod io;
pub mod observer;
pub mod stats;

pub use crate::core::DurationModel;
pub use crate::duration::PoissonDuration;
pub use crate::error::DurationError;
