/*!
Highest-density credible levels of a density grid.

The cells of the grid are ranked by density, densest first. Walking down that ranking,
the cumulative share of the total mass grows; the level for a target mass `p` is the
density of the first cell at which the cumulative share reaches `p`. Drawing the
contour at that level encloses the smallest region holding mass `p`.

The default targets are `0.68²`, `0.95²` and `0.997²`, the 1/2/3-sigma equivalents for
a two-dimensional Gaussian-like posterior.

# Examples

```rust
use line_posterior::contour::contour_levels;
use ndarray::array;

let density = array![[1.0, 0.5], [0.25, 0.0]];
let levels = contour_levels(&density).unwrap();
assert!(levels.one_sigma >= levels.two_sigma);
assert!(levels.two_sigma >= levels.three_sigma);
```
*/

use std::cmp::Ordering;

use ndarray::{Array2, ArrayBase, Data, Ix2};

use crate::error::{PosteriorError, Result};

/// Mass fractions for the 1, 2 and 3-sigma regions.
pub const SIGMA_MASS: [f64; 3] = [0.68 * 0.68, 0.95 * 0.95, 0.997 * 0.997];

/// Density thresholds of the 1, 2 and 3-sigma highest-density regions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourLevels {
    pub one_sigma: f64,
    pub two_sigma: f64,
    pub three_sigma: f64,
}

impl ContourLevels {
    /// Levels from the outermost (3-sigma) to the innermost, i.e. increasing density,
    /// which is the order contour plotting tools expect.
    pub fn ascending(&self) -> [f64; 3] {
        [self.three_sigma, self.two_sigma, self.one_sigma]
    }
}

/// The 1/2/3-sigma levels of `density`; see [`credible_levels`].
pub fn contour_levels<S>(density: &ArrayBase<S, Ix2>) -> Result<ContourLevels>
where
    S: Data<Elem = f64>,
{
    let levels = credible_levels(density, &SIGMA_MASS)?;
    Ok(ContourLevels {
        one_sigma: levels[0],
        two_sigma: levels[1],
        three_sigma: levels[2],
    })
}

/**
Density thresholds enclosing each of the given mass `fractions`.

For every fraction the leftmost position in the descending ranking whose cumulative
share is at least that fraction is chosen; equal densities therefore never split a
level. When floating-point rounding leaves the final cumulative share just below a
fraction of 1, the smallest density is returned.

# Errors

- [`PosteriorError::InvalidMassFraction`] for a fraction outside `(0, 1]`;
- [`PosteriorError::EmptyDensity`] for an empty grid;
- [`PosteriorError::InvalidDensity`] for a negative or non-finite cell;
- [`PosteriorError::ZeroMass`] when all cells are zero.
*/
pub fn credible_levels<S>(density: &ArrayBase<S, Ix2>, fractions: &[f64]) -> Result<Vec<f64>>
where
    S: Data<Elem = f64>,
{
    if let Some(&bad) = fractions.iter().find(|&&f| !(f > 0.0 && f <= 1.0)) {
        return Err(PosteriorError::InvalidMassFraction(bad));
    }
    let (sorted, cumulative) = ranked_mass(density)?;
    Ok(fractions
        .iter()
        .map(|&target| {
            let idx = cumulative.partition_point(|&c| c < target);
            sorted[idx.min(sorted.len() - 1)]
        })
        .collect())
}

/**
Maps every cell to the share of the total mass held by cells at least as dense.

The densest cell maps to its own share, the sparsest to 1. Contouring this map at
`SIGMA_MASS` draws the same regions as contouring the density at the levels from
[`contour_levels`].
*/
pub fn sigma_level_grid<S>(density: &ArrayBase<S, Ix2>) -> Result<Array2<f64>>
where
    S: Data<Elem = f64>,
{
    let (sorted, cumulative) = ranked_mass(density)?;
    Ok(density.mapv(|d| {
        // Last position holding a density >= d, so ties share one value.
        let idx = sorted.partition_point(|&s| s >= d);
        cumulative[idx.saturating_sub(1)]
    }))
}

/// Densities sorted in descending order and their cumulative share of the total.
fn ranked_mass<S>(density: &ArrayBase<S, Ix2>) -> Result<(Vec<f64>, Vec<f64>)>
where
    S: Data<Elem = f64>,
{
    if density.is_empty() {
        return Err(PosteriorError::EmptyDensity);
    }
    if density.iter().any(|d| !d.is_finite() || *d < 0.0) {
        return Err(PosteriorError::InvalidDensity);
    }
    let mut sorted: Vec<f64> = density.iter().copied().collect();
    sorted.sort_unstable_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));

    let total: f64 = sorted.iter().sum();
    if total <= 0.0 {
        return Err(PosteriorError::ZeroMass);
    }
    let cumulative = sorted
        .iter()
        .scan(0.0, |acc, &d| {
            *acc += d;
            Some(*acc / total)
        })
        .collect();
    Ok((sorted, cumulative))
}
