//! Construction parameters for [`PoissonDuration`](crate::duration::PoissonDuration).

use crate::error::DurationError;

/// Default step used when walking outward in the support scan.
pub const DEFAULT_SUPPORT_STEP: usize = 1;

/// Drawn rates above this value are reported to the observer.
pub const DEFAULT_LARGE_RATE_THRESHOLD: f64 = 1000.0;

/// Default stopping threshold of [`PoissonDuration::support`](crate::duration::PoissonDuration::support).
pub const DEFAULT_SUPPORT_THRESHOLD: f64 = 0.00001;

/**
Initial rates, Gamma prior hyperparameters and tuning knobs for a duration model.

The number of states is the length of `mu`; `alpha` and `beta` must have the same length.

# Examples

```rust
use hsmm_duration::config::DurationConfig;

let config = DurationConfig::new(vec![1.0, 1.0, 1.0], vec![1.0; 3], vec![0.0001; 3])
    .support_step(2)
    .seed(42);
assert!(config.validate().is_ok());
assert_eq!(config.n_states(), 3);
```
*/
#[derive(Debug, Clone, PartialEq)]
pub struct DurationConfig {
    /// Initial Poisson rate per state.
    pub mu: Vec<f64>,
    /// Gamma prior shape per state.
    pub alpha: Vec<f64>,
    /// Gamma prior rate per state.
    pub beta: Vec<f64>,
    pub support_step: usize,
    pub large_rate_threshold: f64,
    /// Seed for the model's RNG. Drawn from the thread RNG when `None`.
    pub seed: Option<u64>,
}

impl DurationConfig {
    pub fn new(mu: Vec<f64>, alpha: Vec<f64>, beta: Vec<f64>) -> Self {
        Self {
            mu,
            alpha,
            beta,
            support_step: DEFAULT_SUPPORT_STEP,
            large_rate_threshold: DEFAULT_LARGE_RATE_THRESHOLD,
            seed: None,
        }
    }

    pub fn support_step(mut self, step: usize) -> Self {
        self.support_step = step;
        self
    }

    pub fn large_rate_threshold(mut self, threshold: f64) -> Self {
        self.large_rate_threshold = threshold;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn n_states(&self) -> usize {
        self.mu.len()
    }

    /// Checks that every per-state vector lines up with `mu` and that all rates and
    /// hyperparameters are strictly positive and finite.
    pub fn validate(&self) -> Result<(), DurationError> {
        let n = self.mu.len();
        if n == 0 {
            return Err(DurationError::NoStates);
        }
        for (name, values) in [("alpha", &self.alpha), ("beta", &self.beta)] {
            if values.len() != n {
                return Err(DurationError::LengthMismatch {
                    name,
                    expected: n,
                    found: values.len(),
                });
            }
        }
        validate_rates(&self.mu)?;
        for (name, values) in [("alpha", &self.alpha), ("beta", &self.beta)] {
            if let Some((state, &value)) = values
                .iter()
                .enumerate()
                .find(|(_, v)| !is_positive(**v))
            {
                return Err(DurationError::NonPositiveHyperparameter { name, state, value });
            }
        }
        if self.support_step == 0 {
            return Err(DurationError::InvalidSupportStep);
        }
        if !is_positive(self.large_rate_threshold) {
            return Err(DurationError::InvalidRateThreshold(self.large_rate_threshold));
        }
        Ok(())
    }
}

/// Rejects any rate that is zero, negative, NaN or infinite.
pub(crate) fn validate_rates(mu: &[f64]) -> Result<(), DurationError> {
    match mu.iter().enumerate().find(|(_, v)| !is_positive(**v)) {
        Some((state, &value)) => Err(DurationError::NonPositiveRate { state, value }),
        None => Ok(()),
    }
}

fn is_positive(x: f64) -> bool {
    x.is_finite() && x > 0.0
}
