//! Error type shared by the duration model and its helpers.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DurationError {
    /// A state index outside `0..n_states` was supplied.
    #[error("invalid state {state}: the model has {n_states} states")]
    InvalidState { state: usize, n_states: usize },
    /// A per-state parameter vector does not have one entry per state.
    #[error("expected {expected} values for `{name}`, found {found}")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("the model needs at least one state")]
    NoStates,
    #[error("rate for state {state} must be positive and finite, got {value}")]
    NonPositiveRate { state: usize, value: f64 },
    #[error("`{name}` for state {state} must be positive and finite, got {value}")]
    NonPositiveHyperparameter {
        name: &'static str,
        state: usize,
        value: f64,
    },
    #[error("support step must be at least 1")]
    InvalidSupportStep,
    #[error("large-rate threshold must be positive, got {0}")]
    InvalidRateThreshold(f64),
    #[error("support threshold must be finite and non-negative, got {0}")]
    InvalidThreshold(f64),
    /// A posterior draw underflowed to zero or overflowed; the stored rates are left unchanged.
    #[error("drew a degenerate rate {value} for state {state}")]
    DegenerateRate { state: usize, value: f64 },
    #[error("distribution error: {0}")]
    Distribution(String),
}
