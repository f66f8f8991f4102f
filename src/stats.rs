//! Sufficient statistics for the duration model: per-state run-lengths.

use crate::error::DurationError;

/// Run-lengths of every maximal contiguous run, grouped by state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLengths {
    runs: Vec<Vec<u64>>,
}

impl RunLengths {
    /// An empty set of statistics for `n_states` states.
    pub fn new(n_states: usize) -> Self {
        Self {
            runs: vec![Vec::new(); n_states],
        }
    }

    pub fn n_states(&self) -> usize {
        self.runs.len()
    }

    /// The run-lengths observed for `state`, in the order they were encountered.
    pub fn runs(&self, state: usize) -> &[u64] {
        &self.runs[state]
    }

    /// Total number of time-steps spent in `state`.
    pub fn total(&self, state: usize) -> u64 {
        self.runs[state].iter().sum()
    }

    /// Number of runs of `state`.
    pub fn count(&self, state: usize) -> usize {
        self.runs[state].len()
    }

    /// Appends the runs of `other` to `self`, state by state.
    pub fn merge(&mut self, other: &RunLengths) {
        if self.runs.len() < other.runs.len() {
            self.runs.resize(other.runs.len(), Vec::new());
        }
        for (mine, theirs) in self.runs.iter_mut().zip(other.runs.iter()) {
            mine.extend_from_slice(theirs);
        }
    }

    fn push_sequence<O>(&mut self, sequence: &[(usize, O)]) -> Result<(), DurationError> {
        let n_states = self.runs.len();
        let mut current: Option<(usize, u64)> = None;

        for &(state, _) in sequence {
            if state >= n_states {
                return Err(DurationError::InvalidState { state, n_states });
            }
            current = match current {
                Some((s, len)) if s == state => Some((s, len + 1)),
                Some((s, len)) => {
                    self.runs[s].push(len);
                    Some((state, 1))
                }
                // Start of sequence: the first label opens a run of length 1.
                None => Some((state, 1)),
            };
        }
        if let Some((s, len)) = current {
            self.runs[s].push(len);
        }
        Ok(())
    }
}

/**
Extracts per-state run-lengths from labelled `(state, observation)` sequences.

Each sequence is scanned independently; runs never continue across sequence boundaries.
Empty sequences contribute nothing and states that never appear get an empty run list.

# Examples

```rust
use hsmm_duration::stats::run_lengths;

let z: Vec<(usize, f64)> = vec![(0, 0.1), (0, 0.3), (0, 0.2), (1, 1.5), (1, 1.1), (2, -0.4)];
let k = run_lengths(&[z], 3).unwrap();
assert_eq!(k.runs(0), &[3]);
assert_eq!(k.runs(1), &[2]);
assert_eq!(k.runs(2), &[1]);
```
*/
pub fn run_lengths<S, O>(sequences: &[S], n_states: usize) -> Result<RunLengths, DurationError>
where
    S: AsRef<[(usize, O)]>,
{
    let mut k = RunLengths::new(n_states);
    for sequence in sequences {
        k.push_sequence(sequence.as_ref())?;
    }
    Ok(k)
}
