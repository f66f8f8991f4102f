//! Diagnostic hooks for the duration model.
//!
//! The model reports what it observed and what it drew through a [`DurationObserver`]
//! supplied at construction instead of writing to a logger directly. [`LogObserver`]
//! forwards everything to the `log` facade and is the default.

use log::{debug, warn};

use crate::distributions::GammaPosterior;

/// Receives diagnostics from [`PoissonDuration`](crate::duration::PoissonDuration).
///
/// Every hook has an empty default implementation.
pub trait DurationObserver {
    /// Run-lengths extracted for `state` before a posterior draw.
    fn observations(&mut self, _state: usize, _runs: &[u64]) {}

    /// Gamma parameters about to be sampled from.
    fn posterior(&mut self, _state: usize, _posterior: &GammaPosterior) {}

    /// A freshly drawn rate.
    fn sampled(&mut self, _state: usize, _rate: f64) {}

    /// A drawn rate exceeded the model's large-rate threshold.
    fn large_rate(&mut self, _state: usize, _rate: f64, _posterior: &GammaPosterior) {}

    /// The duration support found for `state`.
    fn support(&mut self, _state: usize, _left: u64, _right: u64) {}
}

/// Writes diagnostics through the `log` crate under the `duration` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl DurationObserver for LogObserver {
    fn observations(&mut self, state: usize, runs: &[u64]) {
        debug!(target: "duration", "state: {state}");
        debug!(target: "duration", "observations: {runs:?}");
    }

    fn posterior(&mut self, state: usize, posterior: &GammaPosterior) {
        debug!(
            target: "duration",
            "state {state}: drawing mu from a gamma with alpha={} and beta={}",
            posterior.shape,
            posterior.rate
        );
    }

    fn sampled(&mut self, state: usize, rate: f64) {
        debug!(target: "duration", "sampled rate parameter for state {state}: {rate}");
    }

    fn large_rate(&mut self, state: usize, rate: f64, posterior: &GammaPosterior) {
        warn!(
            target: "duration",
            "large rate {rate} for state {state} (alpha={}, beta={})",
            posterior.shape,
            posterior.rate
        );
    }

    fn support(&mut self, state: usize, left: u64, right: u64) {
        debug!(target: "duration", "support for state {state}: {left} to {right}");
    }
}

/// Discards all diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl DurationObserver for NullObserver {}

/// Records every event in memory. Handy for tests and for callers that want to inspect a
/// sampling step after the fact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingObserver {
    pub observations: Vec<(usize, Vec<u64>)>,
    pub posteriors: Vec<(usize, GammaPosterior)>,
    pub sampled: Vec<(usize, f64)>,
    pub large_rates: Vec<(usize, f64)>,
    pub supports: Vec<(usize, u64, u64)>,
}

impl DurationObserver for RecordingObserver {
    fn observations(&mut self, state: usize, runs: &[u64]) {
        self.observations.push((state, runs.to_vec()));
    }

    fn posterior(&mut self, state: usize, posterior: &GammaPosterior) {
        self.posteriors.push((state, *posterior));
    }

    fn sampled(&mut self, state: usize, rate: f64) {
        self.sampled.push((state, rate));
    }

    fn large_rate(&mut self, state: usize, rate: f64, _posterior: &GammaPosterior) {
        self.large_rates.push((state, rate));
    }

    fn support(&mut self, state: usize, left: u64, right: u64) {
        self.supports.push((state, left, right));
    }
}
