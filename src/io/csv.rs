/*!
# CSV Export

Writes observations, density grids and MCMC chains as CSV files. Enable via the `csv` feature.

# Examples

```rust
use line_posterior::data::make_data;
use line_posterior::io::csv::save_observations;

let data = make_data(25.0, 0.5, 20, 5.0, 42).unwrap();
let file = tempfile::NamedTempFile::new().unwrap();
save_observations(&data, file.path()).unwrap();
```
*/

use std::path::Path;

use csv::Writer;
use ndarray::{Array3, Axis};

use crate::data::ObservationSet;
use crate::error::Result;
use crate::grid::DensityGrid;

/// Writes one `x,y,sigma` row per observation.
pub fn save_observations<P: AsRef<Path>>(data: &ObservationSet, path: P) -> Result<()> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record(["x", "y", "sigma"])?;
    for (x, y, sigma) in data.iter() {
        wtr.write_record(&[x.to_string(), y.to_string(), sigma.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

/**
Writes a density grid in long format: one `intercept,slope,density` row per cell,
intercept-major, matching the row-major layout of [`DensityGrid::density`].
*/
pub fn save_density_grid<P: AsRef<Path>>(grid: &DensityGrid, path: P) -> Result<()> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record(["intercept", "slope", "density"])?;
    for ((i, j), d) in grid.density().indexed_iter() {
        wtr.write_record(&[
            grid.intercepts()[i].to_string(),
            grid.slopes()[j].to_string(),
            d.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/**
Saves MCMC sample data as a CSV file.

The data is expected to be in a shape of **chain × step × dimension**.

The resulting CSV file will have:
- A header row containing `"chain"`, `"step"`, and one column per dimension
  named `"dim_0"`, `"dim_1"`, etc.
- Each subsequent row will correspond to a single step of a specific chain.
*/
pub fn save_chains<T: std::fmt::Display, P: AsRef<Path>>(data: &Array3<T>, path: P) -> Result<()> {
    let mut wtr = Writer::from_path(path)?;
    let n_dims = data.shape()[2];

    let mut header: Vec<String> = vec!["chain".to_string(), "step".to_string()];
    header.extend((0..n_dims).map(|i| format!("dim_{}", i)));
    wtr.write_record(&header)?;

    for (chain_idx, chain) in data.axis_iter(Axis(0)).enumerate() {
        for (step_idx, step) in chain.axis_iter(Axis(0)).enumerate() {
            let mut row = vec![chain_idx.to_string(), step_idx.to_string()];
            row.extend(step.iter().map(|v| v.to_string()));
            wtr.write_record(&row)?;
        }
    }

    wtr.flush()?;
    Ok(())
}
