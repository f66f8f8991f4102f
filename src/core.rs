use indicatif::ProgressBar;
use ndarray::{s, Array1, Array2, ArrayView1, Axis};

use crate::duration::PoissonDuration;
use crate::error::DurationError;
use crate::observer::DurationObserver;

/// The operations an outer HSMM Gibbs sampler needs from a state-duration model.
pub trait DurationModel {
    fn n_states(&self) -> usize;

    /// Current duration parameters, one per state.
    fn rates(&self) -> &[f64];

    /// Log-probability of a duration `k` in `state`.
    fn likelihood(&self, state: usize, k: u64) -> Result<f64, DurationError>;

    /// Draws a synthetic duration for `state`.
    fn sample_d(&mut self, state: usize) -> Result<u64, DurationError>;

    /// One Gibbs step on the duration parameters given labelled sequences.
    fn update<S, T>(&mut self, sequences: &[S]) -> Result<(), DurationError>
    where
        S: AsRef<[(usize, T)]>;

    /// Range of durations worth evaluating for `state`.
    fn support(&mut self, state: usize, threshold: f64) -> Result<(u64, u64), DurationError>;
}

impl<O: DurationObserver> DurationModel for PoissonDuration<O> {
    fn n_states(&self) -> usize {
        self.mu().len()
    }

    fn rates(&self) -> &[f64] {
        self.mu()
    }

    fn likelihood(&self, state: usize, k: u64) -> Result<f64, DurationError> {
        PoissonDuration::<O>::likelihood(self, state, k)
    }

    fn sample_d(&mut self, state: usize) -> Result<u64, DurationError> {
        PoissonDuration::<O>::sample_d(self, state)
    }

    fn update<S, T>(&mut self, sequences: &[S]) -> Result<(), DurationError>
    where
        S: AsRef<[(usize, T)]>,
    {
        PoissonDuration::<O>::update(self, sequences)
    }

    fn support(&mut self, state: usize, threshold: f64) -> Result<(u64, u64), DurationError> {
        PoissonDuration::<O>::support(self, state, threshold)
    }
}

/// Repeatedly updates `model` on fixed `sequences` and records the rates after each step.
///
/// Returns an `n_steps × n_states` array.
pub fn run_updates<M, S, T>(
    model: &mut M,
    sequences: &[S],
    n_steps: usize,
) -> Result<Array2<f64>, DurationError>
where
    M: DurationModel,
    S: AsRef<[(usize, T)]>,
{
    let mut out = Array2::<f64>::zeros((n_steps, model.n_states()));

    for i in 0..n_steps {
        model.update(sequences)?;
        out.row_mut(i).assign(&ArrayView1::from(model.rates()));
    }

    Ok(out)
}

pub fn run_updates_with_progress<M, S, T>(
    model: &mut M,
    sequences: &[S],
    n_steps: usize,
    pb: &ProgressBar,
) -> Result<Array2<f64>, DurationError>
where
    M: DurationModel,
    S: AsRef<[(usize, T)]>,
{
    let mut out = Array2::<f64>::zeros((n_steps, model.n_states()));

    pb.set_length(n_steps as u64);

    for i in 0..n_steps {
        model.update(sequences)?;
        out.row_mut(i).assign(&ArrayView1::from(model.rates()));

        // Update progress bar
        pb.inc(1);
    }

    Ok(out)
}

/// Posterior predictive durations for `state`: each step draws new rates, then one duration
/// from the freshly drawn rate.
pub fn predictive_durations<M, S, T>(
    model: &mut M,
    sequences: &[S],
    state: usize,
    n_steps: usize,
) -> Result<Vec<u64>, DurationError>
where
    M: DurationModel,
    S: AsRef<[(usize, T)]>,
{
    (0..n_steps)
        .map(|_| {
            model.update(sequences)?;
            model.sample_d(state)
        })
        .collect()
}

/// Per-state mean of a rate trace after discarding the first `discard` rows.
///
/// Returns `None` when nothing is left after the burn-in.
pub fn posterior_mean_trace(trace: &Array2<f64>, discard: usize) -> Option<Array1<f64>> {
    if discard >= trace.nrows() {
        return None;
    }
    trace.slice(s![discard.., ..]).mean_axis(Axis(0))
}
