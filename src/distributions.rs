/*!
Poisson and Gamma building blocks for the duration model.

Durations are modelled as Poisson counts and each state's Poisson rate carries a Gamma
prior. Because the Gamma is conjugate to the Poisson, observing a set of run-lengths only
shifts the Gamma parameters (see [`GammaPosterior::observe`]).

# Examples

```rust
use hsmm_duration::distributions::{DiscreteDistribution, GammaPosterior, Poisson};
use rand::rngs::SmallRng;
use rand::SeedableRng;

let mut rng = SmallRng::seed_from_u64(42);

let poisson = Poisson::new(4.0).unwrap();
let k = poisson.sample(&mut rng);
println!("log p({k}) = {}", poisson.log_prob(k));

// Gamma(1, 1e-4) prior, two runs of total length 8.
let posterior = GammaPosterior::prior(1.0, 0.0001).observe(8, 2);
assert_eq!(posterior.shape, 9.0);
let rate = posterior.sample(&mut rng).unwrap();
assert!(rate > 0.0);
```
*/

use rand::Rng;
use rand_distr::{Distribution, Gamma};

use crate::error::DurationError;

/// A trait for distributions over the non-negative integers.
pub trait DiscreteDistribution {
    /// Draws one value.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64;
    /// Evaluates the natural-log probability mass of `k`.
    fn log_prob(&self, k: u64) -> f64;
}

/// `ln(k!)`, accumulated as the sum of `ln(i + 1)` for `i` in `0..k`.
pub fn ln_factorial(k: u64) -> f64 {
    (0..k).map(|i| ((i + 1) as f64).ln()).sum()
}

/// Log-pmf of a Poisson with rate `mu`: `k ln(mu) - ln(k!) - mu`.
///
/// No guard is applied for `mu == 0`; the model rejects such rates before they get here.
pub fn poisson_ln_pmf(k: u64, mu: f64) -> f64 {
    k as f64 * mu.ln() - ln_factorial(k) - mu
}

/// A Poisson distribution with a strictly positive rate.
///
/// The `rand_distr` sampler is built once in [`Poisson::new`] and reused for every draw.
#[derive(Debug, Clone, Copy)]
pub struct Poisson {
    pub rate: f64,
    distr: rand_distr::Poisson<f64>,
}

impl Poisson {
    pub fn new(rate: f64) -> Result<Self, DurationError> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(DurationError::Distribution(format!(
                "Poisson rate must be positive and finite, got {rate}"
            )));
        }
        let distr = rand_distr::Poisson::new(rate)
            .map_err(|e| DurationError::Distribution(e.to_string()))?;
        Ok(Self { rate, distr })
    }
}

impl DiscreteDistribution for Poisson {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        let draw: f64 = self.distr.sample(rng);
        draw as u64
    }

    fn log_prob(&self, k: u64) -> f64 {
        poisson_ln_pmf(k, self.rate)
    }
}

/// Shape/rate parameters of a Gamma distribution over a Poisson rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GammaPosterior {
    /// Shape (`alpha`).
    pub shape: f64,
    /// Rate (`beta`), i.e. the inverse scale.
    pub rate: f64,
}

impl GammaPosterior {
    /// The prior before any run-lengths are observed.
    pub fn prior(alpha: f64, beta: f64) -> Self {
        Self {
            shape: alpha,
            rate: beta,
        }
    }

    /// Conjugate update with `count` Poisson observations summing to `total`.
    ///
    /// With `count == 0` the parameters are returned unchanged.
    pub fn observe(self, total: u64, count: usize) -> Self {
        Self {
            shape: self.shape + total as f64,
            rate: self.rate + count as f64,
        }
    }

    pub fn scale(&self) -> f64 {
        1.0 / self.rate
    }

    pub fn mean(&self) -> f64 {
        self.shape / self.rate
    }

    /// Draws a Poisson rate from `Gamma(shape, scale = 1 / rate)`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64, DurationError> {
        let gamma = Gamma::new(self.shape, self.scale())
            .map_err(|e| DurationError::Distribution(e.to_string()))?;
        Ok(gamma.sample(rng))
    }
}
