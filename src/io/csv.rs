/*!
# I/O Utilities for Saving Chains to CSV

This module provides functions to save sampled chains to CSV files. Enable via the `csv` feature.
*/

use ndarray::{Array2, Axis};
use std::error::Error;
use std::fs::File;
use std::path::Path;

use csv::Writer;

/**
Saves sampled chains as a CSV file.

The data is expected to be in a shape of **chain × sample**, as returned by
[`ChainRunner::run`](crate::core::ChainRunner::run).

The resulting CSV file will have:
- A header row containing `"chain"`, `"sample"` and `"x"`.
- Each subsequent row will correspond to a single sample of a specific chain.

# Arguments

* `data` - An `Array2<T>` holding one chain per row.
* `filename` - The file path where the CSV data will be written.

# Returns

Returns `Ok(())` if successful, or an error if any I/O or CSV formatting
issue occurs.

# Examples

```rust
use mini_metropolis::io::csv::save_csv;
use ndarray::arr2;

let data = arr2(&[[0.1, 0.2, 0.3], [1.0, 1.5, 1.5]]);
let file = tempfile::NamedTempFile::new()?;
save_csv(&data, file.path())?;
# Ok::<(), Box<dyn std::error::Error>>(())
```
*/
pub fn save_csv<T: std::fmt::Display>(
    data: &Array2<T>,
    filename: impl AsRef<Path>,
) -> Result<(), Box<dyn Error>> {
    let mut wtr = Writer::from_writer(File::create(filename)?);
    wtr.write_record(["chain", "sample", "x"])?;

    for (chain_idx, chain) in data.axis_iter(Axis(0)).enumerate() {
        for (sample_idx, x) in chain.iter().enumerate() {
            wtr.write_record(&[chain_idx.to_string(), sample_idx.to_string(), x.to_string()])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
