/*!
# Poisson Duration Model

State durations of a hidden semi-Markov model, each state's run-length being Poisson with
its own rate `mu[state]`. The rates carry independent `Gamma(alpha[state], beta[state])`
priors and are resampled from their conjugate posterior given labelled state sequences,
one Gibbs step per call to [`PoissonDuration::update`].

## Example Usage

```rust
use hsmm_duration::duration::PoissonDuration;

let mut model = PoissonDuration::new(
    vec![1.0, 1.0, 1.0],
    vec![1.0, 1.0, 1.0],
    vec![0.0001, 0.0001, 0.0001],
)
.unwrap()
.set_seed(42);

// One labelled trajectory: five steps in state 0, one in state 1, three in state 0,
// two in state 2. Observations are ignored by the duration model.
let states = [0, 0, 0, 0, 0, 1, 0, 0, 0, 2, 2];
let z: Vec<(usize, f64)> = states.iter().map(|&s| (s, 0.0)).collect();

model.update(&[z]).unwrap();
assert_eq!(model.mu().len(), 3);

let lp = model.likelihood(0, 4).unwrap();
let (left, right) = model.support(0, 0.00001).unwrap();
assert!(left >= 1 && right >= left);
println!("log p(4) = {lp}, support = [{left}, {right}]");
```
*/

use rand::prelude::*;

use crate::config::{validate_rates, DurationConfig, DEFAULT_SUPPORT_THRESHOLD};
use crate::distributions::{poisson_ln_pmf, DiscreteDistribution, GammaPosterior, Poisson};
use crate::error::DurationError;
use crate::observer::{DurationObserver, LogObserver};
use crate::stats::run_lengths;

/// Poisson state-duration model with Gamma priors on the per-state rates.
///
/// The observer type `O` receives diagnostics; see [`crate::observer`].
#[derive(Debug, Clone)]
pub struct PoissonDuration<O = LogObserver> {
    mu: Vec<f64>,
    alpha: Vec<f64>,
    beta: Vec<f64>,
    support_step: usize,
    large_rate_threshold: f64,
    /// The random seed the model's RNG was created from.
    pub seed: u64,
    rng: SmallRng,
    observer: O,
}

impl PoissonDuration<LogObserver> {
    /// Creates a model with initial rates `mu` and Gamma prior shapes `alpha` and rates
    /// `beta`, one entry per state, using the default support step of 1.
    pub fn new(mu: Vec<f64>, alpha: Vec<f64>, beta: Vec<f64>) -> Result<Self, DurationError> {
        Self::from_config(DurationConfig::new(mu, alpha, beta))
    }

    pub fn from_config(config: DurationConfig) -> Result<Self, DurationError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(|| thread_rng().gen::<u64>());
        Ok(Self {
            mu: config.mu,
            alpha: config.alpha,
            beta: config.beta,
            support_step: config.support_step,
            large_rate_threshold: config.large_rate_threshold,
            seed,
            rng: SmallRng::seed_from_u64(seed),
            observer: LogObserver,
        })
    }
}

impl<O: DurationObserver> PoissonDuration<O> {
    /// Replaces the observer, keeping parameters and RNG state.
    pub fn with_observer<P: DurationObserver>(self, observer: P) -> PoissonDuration<P> {
        PoissonDuration {
            mu: self.mu,
            alpha: self.alpha,
            beta: self.beta,
            support_step: self.support_step,
            large_rate_threshold: self.large_rate_threshold,
            seed: self.seed,
            rng: self.rng,
            observer,
        }
    }

    /// Sets a new seed and reseeds the RNG.
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    pub fn n_states(&self) -> usize {
        self.mu.len()
    }

    /// Current Poisson rates, one per state.
    pub fn mu(&self) -> &[f64] {
        &self.mu
    }

    pub fn alpha(&self) -> &[f64] {
        &self.alpha
    }

    pub fn beta(&self) -> &[f64] {
        &self.beta
    }

    pub fn support_step(&self) -> usize {
        self.support_step
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Replaces the rates, e.g. with previously trained values.
    pub fn set_mu(&mut self, mu: Vec<f64>) -> Result<(), DurationError> {
        if mu.len() != self.mu.len() {
            return Err(DurationError::LengthMismatch {
                name: "mu",
                expected: self.mu.len(),
                found: mu.len(),
            });
        }
        validate_rates(&mu)?;
        self.mu = mu;
        Ok(())
    }

    fn check_state(&self, state: usize) -> Result<(), DurationError> {
        if state < self.mu.len() {
            Ok(())
        } else {
            Err(DurationError::InvalidState {
                state,
                n_states: self.mu.len(),
            })
        }
    }

    /// Natural-log Poisson probability of a duration `k` in `state`:
    /// `k ln(mu) - ln(k!) - mu`.
    pub fn likelihood(&self, state: usize, k: u64) -> Result<f64, DurationError> {
        self.check_state(state)?;
        Ok(poisson_ln_pmf(k, self.mu[state]))
    }

    /// Draws a synthetic duration for `state` from `Poisson(mu[state])`.
    pub fn sample_d(&mut self, state: usize) -> Result<u64, DurationError> {
        self.check_state(state)?;
        let poisson = Poisson::new(self.mu[state])?;
        Ok(poisson.sample(&mut self.rng))
    }

    /// Gamma posterior of every state's rate given the run-lengths in `sequences`.
    pub fn posteriors<S, T>(&self, sequences: &[S]) -> Result<Vec<GammaPosterior>, DurationError>
    where
        S: AsRef<[(usize, T)]>,
    {
        let k = run_lengths(sequences, self.n_states())?;
        Ok((0..self.n_states())
            .map(|i| {
                GammaPosterior::prior(self.alpha[i], self.beta[i]).observe(k.total(i), k.count(i))
            })
            .collect())
    }

    /**
    Draws one new rate per state from its Gamma posterior given `sequences`.

    For each state the posterior is `Gamma(alpha + sum(k), beta + len(k))` where `k` are the
    state's run-lengths. States without runs are drawn from their prior. The stored rates
    are not modified; see [`update`](Self::update).

    # Errors

    * [`DurationError::InvalidState`] if a sequence carries a label outside the model.
    * [`DurationError::DegenerateRate`] if a draw is zero or not finite.
    */
    pub fn sample_mu<S, T>(&mut self, sequences: &[S]) -> Result<Vec<f64>, DurationError>
    where
        S: AsRef<[(usize, T)]>,
    {
        let n = self.n_states();
        let k = run_lengths(sequences, n)?;
        for i in 0..n {
            self.observer.observations(i, k.runs(i));
        }

        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            let posterior =
                GammaPosterior::prior(self.alpha[i], self.beta[i]).observe(k.total(i), k.count(i));
            self.observer.posterior(i, &posterior);
            let rate = posterior.sample(&mut self.rng)?;
            self.observer.sampled(i, rate);
            if !(rate.is_finite() && rate > 0.0) {
                return Err(DurationError::DegenerateRate {
                    state: i,
                    value: rate,
                });
            }
            if rate > self.large_rate_threshold {
                self.observer.large_rate(i, rate, &posterior);
            }
            out.push(rate);
        }
        Ok(out)
    }

    /// One Gibbs step: replaces the stored rates with a fresh posterior draw.
    ///
    /// On error the previous rates are kept.
    pub fn update<S, T>(&mut self, sequences: &[S]) -> Result<(), DurationError>
    where
        S: AsRef<[(usize, T)]>,
    {
        self.mu = self.sample_mu(sequences)?;
        Ok(())
    }

    /**
    Finds the range of durations worth considering for `state`.

    Starting from the mode `floor(mu[state])`, the scan walks left and right in steps of
    `support_step`, comparing the probabilities (not log-probabilities) of successive
    points, and stops once their absolute difference is at most `threshold`. The first
    point of each walk is always taken. The left walk ends one step past the last point it
    evaluated. Both ends are clamped to at least 1.
    A negative or non-finite `threshold` is an [`InvalidThreshold`](DurationError::InvalidThreshold) error.

    Tiny rates make the probabilities themselves tiny, so the walk can stop almost
    immediately; this mirrors how downstream duration inference sizes its windows.
    */
    pub fn support(&mut self, state: usize, threshold: f64) -> Result<(u64, u64), DurationError> {
        self.check_state(state)?;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(DurationError::InvalidThreshold(threshold));
        }
        let mode = self.mu[state].trunc() as u64;
        let step = self.support_step as u64;

        // walk left
        let mut d = mode;
        let mut prev: Option<f64> = None;
        let mut delta = f64::INFINITY;
        while delta > threshold {
            // Every point from here on clamps to 1.
            if d <= 1 {
                break;
            }
            let p = self.likelihood(state, d)?.exp();
            if let Some(q) = prev {
                delta = (p - q).abs();
            }
            prev = Some(p);
            d = d.saturating_sub(step);
        }
        let left = d.max(1);

        // walk right
        let mut d = mode;
        let mut prev: Option<f64> = None;
        let mut delta = f64::INFINITY;
        while delta > threshold {
            d += step;
            let p = self.likelihood(state, d)?.exp();
            if let Some(q) = prev {
                delta = (p - q).abs();
            }
            prev = Some(p);
        }
        let right = d.max(1);

        self.observer.support(state, left, right);
        Ok((left, right))
    }

    /// [`support`](Self::support) with the default threshold of `1e-5`.
    pub fn support_default(&mut self, state: usize) -> Result<(u64, u64), DurationError> {
        self.support(state, DEFAULT_SUPPORT_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::{NullObserver, RecordingObserver};
    use approx::assert_abs_diff_eq;

    fn labelled(states: &[usize]) -> Vec<(usize, f64)> {
        states.iter().map(|&s| (s, s as f64)).collect()
    }

    fn model(mu: Vec<f64>) -> PoissonDuration<NullObserver> {
        let n = mu.len();
        PoissonDuration::new(mu, vec![1.0; n], vec![0.0001; n])
            .unwrap()
            .set_seed(42)
            .with_observer(NullObserver)
    }

    #[test]
    fn likelihood_at_zero_is_minus_rate() {
        let m = model(vec![0.5, 3.0, 12.25]);
        for (state, &mu) in m.mu().iter().enumerate() {
            assert_abs_diff_eq!(m.likelihood(state, 0).unwrap(), -mu, epsilon = 1e-12);
        }
    }

    #[test]
    fn likelihood_matches_pmf() {
        let m = model(vec![4.0]);
        // P(2 | 4) = 16 e^-4 / 2
        let expected = (8.0 * (-4.0f64).exp()).ln();
        assert_abs_diff_eq!(m.likelihood(0, 2).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn likelihood_peaks_near_rate() {
        for mu in [2.3, 5.0, 9.7] {
            let m = model(vec![mu]);
            let best = (0..40u64)
                .max_by(|&a, &b| {
                    m.likelihood(0, a)
                        .unwrap()
                        .partial_cmp(&m.likelihood(0, b).unwrap())
                        .unwrap()
                })
                .unwrap();
            assert!(
                (best as f64 - mu).abs() <= 1.0,
                "mode {best} too far from rate {mu}"
            );
        }
    }

    #[test]
    fn invalid_state_is_rejected() {
        let mut m = model(vec![1.0, 2.0]);
        let expected = DurationError::InvalidState {
            state: 2,
            n_states: 2,
        };
        assert_eq!(m.likelihood(2, 1), Err(expected.clone()));
        assert_eq!(m.sample_d(2), Err(expected.clone()));
        assert_eq!(m.support(2, 1e-5), Err(expected.clone()));
        assert_eq!(m.sample_mu(&[labelled(&[0, 2])]), Err(expected));
    }

    #[test]
    fn zero_rates_rejected_at_construction() {
        let err = PoissonDuration::new(vec![1.0, 0.0], vec![1.0; 2], vec![1.0; 2]).unwrap_err();
        assert_eq!(
            err,
            DurationError::NonPositiveRate {
                state: 1,
                value: 0.0
            }
        );
        let mut m = model(vec![1.0]);
        assert!(m.set_mu(vec![-2.0]).is_err());
        assert!(m.set_mu(vec![1.0, 2.0]).is_err());
        m.set_mu(vec![2.5]).unwrap();
        assert_eq!(m.mu(), &[2.5]);
    }

    #[test]
    fn posterior_of_unseen_state_is_prior() {
        let m = PoissonDuration::new(vec![1.0; 3], vec![2.0, 3.0, 4.0], vec![0.5, 0.25, 0.125])
            .unwrap();
        let post = m.posteriors(&[labelled(&[0, 0, 0, 0, 0, 1, 0, 0, 0])]).unwrap();
        assert_eq!(post[2], GammaPosterior::prior(4.0, 0.125));
        assert_eq!(post[0].shape, 2.0 + 8.0);
        assert_eq!(post[0].rate, 0.5 + 2.0);
        assert_eq!(post[1].shape, 3.0 + 1.0);
        assert_eq!(post[1].rate, 0.25 + 1.0);
    }

    #[test]
    fn sample_mu_converges_to_gamma_mean() {
        let mut m = PoissonDuration::new(vec![1.0; 2], vec![2.0, 1.0], vec![1.0, 0.5])
            .unwrap()
            .set_seed(7)
            .with_observer(NullObserver);
        let z = labelled(&[0, 0, 0, 0, 1, 1, 0, 0, 1, 0, 0, 0, 0, 0, 0]);
        // state 0: runs [4, 2, 6] -> S = 12, C = 3
        let expected = (2.0 + 12.0) / (1.0 + 3.0);
        let n = 20_000;
        let mean = (0..n)
            .map(|_| m.sample_mu(&[z.clone()]).unwrap()[0])
            .sum::<f64>()
            / n as f64;
        assert!(
            (mean - expected).abs() < 0.05,
            "posterior mean {mean} too far from {expected}"
        );
        assert_eq!(m.mu(), &[1.0, 1.0], "sample_mu must not touch the rates");
    }

    #[test]
    fn update_replaces_rates_with_fresh_draws() {
        let mut m = model(vec![1.0, 1.0, 1.0]);
        let z = labelled(&[0, 0, 0, 1, 1, 2]);
        m.update(&[z.clone()]).unwrap();
        let first = m.mu().to_vec();
        m.update(&[z]).unwrap();
        assert_ne!(first, m.mu());
        assert!(m.mu().iter().all(|&r| r > 0.0));
    }

    #[test]
    fn seeded_models_agree() {
        let z = labelled(&[0, 0, 1, 1, 1]);
        let mut a = model(vec![1.0, 1.0]);
        let mut b = model(vec![1.0, 1.0]);
        assert_eq!(a.sample_mu(&[z.clone()]), b.sample_mu(&[z]));
        assert_eq!(a.sample_d(0), b.sample_d(0));
    }

    #[test]
    fn observer_sees_each_step() {
        let mut m = PoissonDuration::new(vec![1.0, 1.0], vec![1.0; 2], vec![1.0; 2])
            .unwrap()
            .set_seed(3)
            .with_observer(RecordingObserver::default());
        m.sample_mu(&[labelled(&[0, 0, 0, 1])]).unwrap();
        let rec = m.observer();
        assert_eq!(rec.observations, vec![(0, vec![3]), (1, vec![1])]);
        assert_eq!(rec.posteriors[0].1, GammaPosterior::prior(4.0, 2.0));
        assert_eq!(rec.sampled.len(), 2);
        assert!(rec.large_rates.is_empty());
    }

    #[test]
    fn large_rates_are_reported_not_rejected() {
        let config = DurationConfig::new(vec![1.0], vec![1.0], vec![0.0001])
            .large_rate_threshold(10.0)
            .seed(11);
        let mut m = PoissonDuration::from_config(config)
            .unwrap()
            .with_observer(RecordingObserver::default());
        // A single run of 500 steps pushes the posterior mean to ~501.
        let z = labelled(&[0; 500]);
        let rates = m.sample_mu(&[z]).unwrap();
        assert!(rates[0] > 10.0);
        assert_eq!(m.observer().large_rates, vec![(0, rates[0])]);
    }

    #[test]
    fn sample_d_mean_tracks_rate() {
        let mut m = model(vec![7.5]);
        let n = 20_000;
        let mean = (0..n).map(|_| m.sample_d(0).unwrap() as f64).sum::<f64>() / n as f64;
        assert!((mean - 7.5).abs() < 0.1, "duration mean {mean} too far from 7.5");
        assert_eq!(m.mu(), &[7.5]);
    }

    #[test]
    fn support_brackets_the_mode() {
        for mu in [1.0, 1.7, 4.0, 12.3, 55.5, 230.0] {
            let mut m = model(vec![mu]);
            let (left, right) = m.support_default(0).unwrap();
            let mode = mu.trunc() as u64;
            assert!(left >= 1 && right >= 1);
            assert!(left <= mode && mode <= right, "[{left}, {right}] vs mode {mode}");
        }
    }

    #[test]
    fn support_for_small_rate_is_clamped() {
        let mut m = model(vec![0.2]);
        let (left, right) = m.support_default(0).unwrap();
        assert_eq!(left, 1);
        assert!(right >= 1);
    }

    #[test]
    fn support_shrinks_with_threshold() {
        let mut m = model(vec![20.0]);
        let mut last_width = u64::MAX;
        for threshold in [1e-9, 1e-7, 1e-5, 1e-3, 1e-2, 0.5] {
            let (left, right) = m.support(0, threshold).unwrap();
            let width = right - left;
            assert!(width <= last_width, "width grew at threshold {threshold}");
            last_width = width;
        }
    }

    #[test]
    fn support_covers_probability_mass() {
        let mut m = model(vec![30.0]);
        let (_, right) = m.support(0, 1e-6).unwrap();
        let tail: f64 = (right + 1..400).map(|k| m.likelihood(0, k).unwrap().exp()).sum();
        assert!(tail < 1e-3, "right tail mass {tail} beyond {right}");
    }

    #[test]
    fn support_step_widens_walk() {
        let config = DurationConfig::new(vec![20.0], vec![1.0], vec![1.0]).support_step(5);
        let mut m = PoissonDuration::from_config(config)
            .unwrap()
            .with_observer(NullObserver);
        let (left, right) = m.support_default(0).unwrap();
        assert_eq!((right - 20) % 5, 0);
        assert!(left == 1 || (20 - left) % 5 == 0);
    }

    #[test]
    fn support_rejects_bad_threshold() {
        let mut m = model(vec![3.0]);
        assert_eq!(
            m.support(0, -1.0),
            Err(DurationError::InvalidThreshold(-1.0))
        );
        assert!(m.support(0, f64::NAN).is_err());
        assert_eq!(
            m.support(0, f64::INFINITY),
            Err(DurationError::InvalidThreshold(f64::INFINITY))
        );
        assert!(m.support(0, 0.0).is_ok());
    }

    #[test]
    fn support_of_integer_rate_stops_left_at_mu_minus_two() {
        // p(mu - 1) == p(mu), so the first comparison already ends the left walk.
        let mut m = model(vec![4.0]);
        let (left, right) = m.support_default(0).unwrap();
        assert_eq!(left, 2);
        assert!(right > 4);
    }

    #[test]
    fn support_with_threshold_at_least_one_takes_two_steps() {
        // Probabilities differ by less than 1, so each walk stops at its first comparison.
        let mut m = model(vec![12.3]);
        assert_eq!(m.support(0, 1.0).unwrap(), (10, 14));
        assert_eq!(m.support(0, 5.0).unwrap(), (10, 14));

        let config = DurationConfig::new(vec![20.0], vec![1.0], vec![1.0]).support_step(3);
        let mut m = PoissonDuration::from_config(config)
            .unwrap()
            .with_observer(NullObserver);
        assert_eq!(m.support(0, 1.0).unwrap(), (14, 26));
    }
}
