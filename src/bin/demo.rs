//! A small demo: fits the Poisson duration model to a synthetic three-state trajectory,
//! then prints posterior rate summaries and a histogram of posterior predictive durations.
//!
//! Run with `RUST_LOG=duration=debug` to see the model's diagnostics.

use hsmm_duration::core::{posterior_mean_trace, run_updates_with_progress};
use hsmm_duration::distributions::{DiscreteDistribution, Poisson};
use hsmm_duration::PoissonDuration;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::error::Error;

/// Builds a labelled trajectory by cycling through the states and drawing each run-length
/// from `Poisson(true_rates[state])` (at least 1).
fn synthetic_sequence(
    true_rates: &[f64],
    n_runs: usize,
    rng: &mut SmallRng,
) -> Result<Vec<(usize, f64)>, Box<dyn Error>> {
    let mut z = Vec::new();
    for run in 0..n_runs {
        let state = run % true_rates.len();
        let len = Poisson::new(true_rates[state])?.sample(rng).max(1);
        for _ in 0..len {
            z.push((state, state as f64 + rng.gen::<f64>()));
        }
    }
    Ok(z)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    const N_DRAWS: usize = 100;
    const N_STEPS: usize = 1000;
    const BURNIN: usize = 100;
    const SEED: u64 = 42;
    let true_rates = [5.0, 2.0, 9.0];

    let mut rng = SmallRng::seed_from_u64(SEED);
    let z = synthetic_sequence(&true_rates, 60, &mut rng)?;
    println!("Generated a trajectory of {} steps", z.len());
    let sequences = [z];

    let mut model =
        PoissonDuration::new(vec![1.0; 3], vec![1.0; 3], vec![0.0001; 3])?.set_seed(SEED);

    // Independent posterior draws of the rates.
    for state in 0..model.n_states() {
        let mut draws = Vec::with_capacity(N_DRAWS);
        for _ in 0..N_DRAWS {
            draws.push(model.sample_mu(&sequences)?[state]);
        }
        let mean = draws.iter().sum::<f64>() / N_DRAWS as f64;
        println!(
            "state {state}: mean of {N_DRAWS} rate draws = {mean:.3} (true rate {})",
            true_rates[state]
        );
    }

    // Repeated Gibbs updates with a progress bar.
    let pb = ProgressBar::new(N_STEPS as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );
    let trace = run_updates_with_progress(&mut model, &sequences, N_STEPS, &pb)?;
    pb.finish_with_message("Done!");

    if let Some(mean) = posterior_mean_trace(&trace, BURNIN) {
        println!("Posterior mean rates after burn-in: {mean:.3}");
    }

    // Posterior predictive durations and their supports.
    for state in 0..model.n_states() {
        let mut durations = Vec::with_capacity(N_STEPS);
        for _ in 0..N_STEPS {
            model.update(&sequences)?;
            durations.push(model.sample_d(state)?);
        }
        let max = durations.iter().copied().max().unwrap_or(0) as usize;
        let mut counts = vec![0usize; max + 1];
        for &d in &durations {
            counts[d as usize] += 1;
        }

        let (left, right) = model.support_default(state)?;
        println!("state {state}: support [{left}, {right}]");
        for (d, &count) in counts.iter().enumerate() {
            if count > 0 {
                println!("  {d:3} {}", "#".repeat((count * 200 / N_STEPS).max(1)));
            }
        }
    }

    Ok(())
}

#[test]
fn test_main() {
    main().expect("Expected main to not return an error.");
}
