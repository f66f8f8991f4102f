/*!
# CSV I/O for Labelled Sequences and Rate Traces

Reads labelled `(state, observation)` sequences for training and writes sampled rate
traces. Enable via the `csv` feature.
*/

use ndarray::Array2;
use std::collections::HashMap;
use std::error::Error;
use std::fs::File;

use csv::{Reader, Writer};

/**
Loads labelled sequences from a CSV file.

The file must have a header row with the columns `sequence`, `state` and `observation`.
Rows sharing a `sequence` id form one sequence, in file order. Sequences are returned in
order of first appearance.

# Examples

```rust
use hsmm_duration::io::csv::load_sequences;
use std::io::Write;

let mut file = tempfile::NamedTempFile::new()?;
writeln!(file, "sequence,state,observation\na,0,0.5\na,0,0.7\na,1,2.0\nb,1,1.9")?;

let sequences = load_sequences(file.path().to_str().unwrap())?;
assert_eq!(sequences.len(), 2);
assert_eq!(sequences[0], vec![(0, 0.5), (0, 0.7), (1, 2.0)]);
# Ok::<(), Box<dyn std::error::Error>>(())
```
*/
pub fn load_sequences(filename: &str) -> Result<Vec<Vec<(usize, f64)>>, Box<dyn Error>> {
    let mut rdr = Reader::from_reader(File::open(filename)?);

    let headers = rdr.headers()?.clone();
    let column = |name: &str| -> Result<usize, Box<dyn Error>> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| format!("missing column `{name}` in {filename}").into())
    };
    let seq_col = column("sequence")?;
    let state_col = column("state")?;
    let obs_col = column("observation")?;

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut sequences: Vec<Vec<(usize, f64)>> = Vec::new();

    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        let field = |col: usize| {
            record
                .get(col)
                .map(str::trim)
                .ok_or_else(|| format!("row {} has no column {col}", line + 1))
        };
        let id = field(seq_col)?;
        let state: usize = field(state_col)?.parse()?;
        let observation: f64 = field(obs_col)?.parse()?;

        let slot = match index.get(id) {
            Some(&i) => i,
            None => {
                index.insert(id.to_string(), sequences.len());
                sequences.push(Vec::new());
                sequences.len() - 1
            }
        };
        sequences[slot].push((state, observation));
    }

    Ok(sequences)
}

/**
Saves a rate trace (sample × state) as a CSV file.

The header row is `sample`, followed by `state_0`, `state_1`, ... and each subsequent row
holds the rates drawn at one step.

# Examples

```rust
use hsmm_duration::io::csv::save_trace;
use ndarray::arr2;

let trace = arr2(&[[4.5, 1.0], [4.2, 0.9]]);
save_trace(&trace, "/tmp/trace.csv").expect("Expecting saving the trace to succeed");
```
*/
pub fn save_trace(trace: &Array2<f64>, filename: &str) -> Result<(), Box<dyn Error>> {
    let mut wtr = Writer::from_writer(File::create(filename)?);

    let mut header: Vec<String> = vec!["sample".to_string()];
    header.extend((0..trace.ncols()).map(|i| format!("state_{}", i)));
    wtr.write_record(&header)?;

    for (sample_idx, row) in trace.rows().into_iter().enumerate() {
        let mut record = vec![sample_idx.to_string()];
        record.extend(row.iter().map(|v| v.to_string()));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}
