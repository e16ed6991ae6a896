/*!
Brute-force posterior evaluation over a two-dimensional `(intercept, slope)` grid.

[`GridEvaluator`] evaluates `log_prior + log_likelihood` at every pair of the Cartesian
product of two [`ParamRange`]s (in parallel across cells), subtracts the grid-wide
maximum and exponentiates. The resulting [`DensityGrid`] therefore peaks at exactly 1.

# Examples

```rust
use line_posterior::data::make_data;
use line_posterior::grid::{evaluate_grid, ParamRange};
use line_posterior::likelihood::Likelihood;
use line_posterior::posterior::Posterior;
use line_posterior::prior::Prior;

let data = make_data(25.0, 0.5, 20, 5.0, 42).unwrap();
let posterior = Posterior::new(data, Prior::flat(), Likelihood::Gaussian);
let grid = evaluate_grid(
    &posterior,
    ParamRange::new(15.0, 35.0, 50).unwrap(),
    ParamRange::new(0.3, 0.7, 50).unwrap(),
)
.unwrap();
assert_eq!(grid.density().dim(), (50, 50));
assert_eq!(grid.density().iter().cloned().fold(0.0, f64::max), 1.0);
```
*/

use log::{debug, warn};
use ndarray::{Array1, Array2, ArrayView1};
use ndarray_stats::QuantileExt;
use rayon::prelude::*;

use crate::error::{PosteriorError, Result};
use crate::likelihood::LogLikelihood;
use crate::posterior::Posterior;
use crate::prior::LogPrior;

/// `n` evenly spaced values from `start` to `stop`, both included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    start: f64,
    stop: f64,
    n: usize,
}

impl ParamRange {
    /// # Errors
    ///
    /// [`PosteriorError::InvalidRange`] for non-finite bounds, `n == 0`, or
    /// `start >= stop` with more than one point.
    pub fn new(start: f64, stop: f64, n: usize) -> Result<Self> {
        if !(start.is_finite() && stop.is_finite()) {
            return Err(PosteriorError::InvalidRange(format!(
                "bounds must be finite, got [{start}, {stop}]"
            )));
        }
        if n == 0 {
            return Err(PosteriorError::InvalidRange("at least one point required".into()));
        }
        if n > 1 && start >= stop {
            return Err(PosteriorError::InvalidRange(format!(
                "start {start} must be below stop {stop}"
            )));
        }
        Ok(Self { start, stop, n })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn stop(&self) -> f64 {
        self.stop
    }

    pub fn len(&self) -> usize {
        self.n
    }

    /// Always false for a range built by [`ParamRange::new`], which requires at least one
    /// point; provided alongside [`ParamRange::len`].
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Distance between neighbouring values; 0 for a single point.
    pub fn step(&self) -> f64 {
        if self.n > 1 {
            (self.stop - self.start) / (self.n - 1) as f64
        } else {
            0.0
        }
    }

    pub fn values(&self) -> Array1<f64> {
        Array1::linspace(self.start, self.stop, self.n)
    }

    /// Index of the value closest to `v`, or `None` when `v` falls outside the cells
    /// centred on the values.
    fn bin(&self, v: f64) -> Option<usize> {
        let step = self.step();
        if step == 0.0 || !v.is_finite() {
            return None;
        }
        let pos = ((v - self.start) / step).round();
        if pos >= 0.0 && pos < self.n as f64 {
            Some(pos as usize)
        } else {
            None
        }
    }
}

/// Normalized posterior density over an `(intercept, slope)` grid.
///
/// `density()[[i, j]]` belongs to `intercepts()[i]` and `slopes()[j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    intercepts: Array1<f64>,
    slopes: Array1<f64>,
    density: Array2<f64>,
    prior_only: bool,
}

impl DensityGrid {
    /**
    Normalizes a grid of log-densities: subtracts the maximum and exponentiates.

    # Errors

    - [`PosteriorError::UndefinedPosterior`] if a cell is NaN;
    - [`PosteriorError::EmptyPosteriorGrid`] if every cell is negative infinity;
    - [`PosteriorError::InvalidRange`] if the axes do not match the grid's shape.
    */
    pub fn from_log_density(
        intercepts: Array1<f64>,
        slopes: Array1<f64>,
        log_density: Array2<f64>,
    ) -> Result<Self> {
        check_axes(&intercepts, &slopes, &log_density)?;
        if let Some(((i, j), _)) = log_density.indexed_iter().find(|(_, v)| v.is_nan()) {
            return Err(PosteriorError::UndefinedPosterior {
                intercept: intercepts[i],
                slope: slopes[j],
            });
        }
        let max = *log_density.max().map_err(|_| PosteriorError::EmptyDensity)?;
        if max == f64::NEG_INFINITY {
            return Err(PosteriorError::EmptyPosteriorGrid);
        }
        debug!("max log-posterior {max:.4} over {:?} grid", log_density.dim());
        let density = log_density.mapv(|v| (v - max).exp());
        Ok(Self {
            intercepts,
            slopes,
            density,
            prior_only: false,
        })
    }

    /**
    2D histogram of sampled `(intercept, slope)` pairs, normalized to a peak of 1.

    Each value of the two ranges is the centre of one bin; samples falling outside all
    bins are ignored.

    # Errors

    [`PosteriorError::InvalidRange`] if either range has a single point and
    [`PosteriorError::ZeroMass`] if no sample lands in the grid.
    */
    pub fn from_samples(
        intercepts: ArrayView1<f64>,
        slopes: ArrayView1<f64>,
        intercept_range: ParamRange,
        slope_range: ParamRange,
    ) -> Result<Self> {
        if intercept_range.len() < 2 || slope_range.len() < 2 {
            return Err(PosteriorError::InvalidRange(
                "histogram ranges need at least two bins".into(),
            ));
        }
        let mut counts = Array2::<f64>::zeros((intercept_range.len(), slope_range.len()));
        for (&b, &m) in intercepts.iter().zip(slopes.iter()) {
            if let (Some(i), Some(j)) = (intercept_range.bin(b), slope_range.bin(m)) {
                counts[[i, j]] += 1.0;
            }
        }
        let max = counts.iter().cloned().fold(0.0, f64::max);
        if max == 0.0 {
            return Err(PosteriorError::ZeroMass);
        }
        counts.mapv_inplace(|c| c / max);
        Ok(Self {
            intercepts: intercept_range.values(),
            slopes: slope_range.values(),
            density: counts,
            prior_only: false,
        })
    }

    pub fn intercepts(&self) -> &Array1<f64> {
        &self.intercepts
    }

    pub fn slopes(&self) -> &Array1<f64> {
        &self.slopes
    }

    pub fn density(&self) -> &Array2<f64> {
        &self.density
    }

    /// `true` when the grid was evaluated without observations and so shows the prior alone.
    pub fn is_prior_only(&self) -> bool {
        self.prior_only
    }

    /// Index of the densest cell, the first one in row-major order on ties.
    pub fn peak_index(&self) -> (usize, usize) {
        // Densities are finite and non-negative, so the ordering is total.
        self.density.argmax().unwrap_or((0, 0))
    }

    /// `(intercept, slope)` of the densest cell.
    pub fn peak(&self) -> (f64, f64) {
        let (i, j) = self.peak_index();
        (self.intercepts[i], self.slopes[j])
    }

    /// Spacing of the intercept and slope axes.
    pub fn cell_widths(&self) -> (f64, f64) {
        (axis_step(&self.intercepts), axis_step(&self.slopes))
    }
}

fn axis_step(axis: &Array1<f64>) -> f64 {
    if axis.len() > 1 {
        (axis[axis.len() - 1] - axis[0]) / (axis.len() - 1) as f64
    } else {
        0.0
    }
}

fn check_axes(intercepts: &Array1<f64>, slopes: &Array1<f64>, grid: &Array2<f64>) -> Result<()> {
    if grid.dim() != (intercepts.len(), slopes.len()) {
        return Err(PosteriorError::InvalidRange(format!(
            "axes of length ({}, {}) do not match grid of shape {:?}",
            intercepts.len(),
            slopes.len(),
            grid.dim()
        )));
    }
    Ok(())
}

/**
Evaluates a posterior over `intercepts × slopes`.

Parameters past the slope (e.g. an intrinsic scatter) are held at the values given to
[`GridEvaluator::with_fixed`].
*/
#[derive(Debug, Clone, PartialEq)]
pub struct GridEvaluator {
    pub intercepts: ParamRange,
    pub slopes: ParamRange,
    pub fixed: Vec<f64>,
}

impl GridEvaluator {
    pub fn new(intercepts: ParamRange, slopes: ParamRange) -> Self {
        Self {
            intercepts,
            slopes,
            fixed: Vec::new(),
        }
    }

    /// Appends fixed values for the parameters after `(intercept, slope)`.
    pub fn with_fixed(mut self, fixed: &[f64]) -> Self {
        self.fixed = fixed.to_vec();
        self
    }

    /**
    The raw log-posterior at every grid cell, before normalization.

    # Errors

    [`PosteriorError::InvalidConfig`] if the likelihood declares a parameter count other
    than 2 plus the number of fixed values.
    */
    pub fn log_posterior<P, L>(&self, posterior: &Posterior<P, L>) -> Result<Array2<f64>>
    where
        P: LogPrior + Sync,
        L: LogLikelihood + Sync,
    {
        let n_theta = 2 + self.fixed.len();
        if let Some(expected) = posterior.n_params().filter(|&n| n != n_theta) {
            return Err(PosteriorError::InvalidConfig(format!(
                "likelihood needs {expected} parameters, grid supplies {n_theta}"
            )));
        }
        let intercepts = self.intercepts.values();
        let slopes = self.slopes.values();
        let (nb, nm) = (intercepts.len(), slopes.len());
        let mut template = vec![0.0; 2];
        template.extend_from_slice(&self.fixed);

        debug!(
            "evaluating {nb}x{nm} posterior grid over {} observations",
            posterior.observations.len()
        );
        let values: Vec<f64> = (0..nb * nm)
            .into_par_iter()
            .map_init(
                || template.clone(),
                |theta, k| {
                    theta[0] = intercepts[k / nm];
                    theta[1] = slopes[k % nm];
                    posterior.log_posterior(theta)
                },
            )
            .collect();
        Ok(Array2::from_shape_vec((nb, nm), values)?)
    }

    /**
    Evaluates and normalizes the posterior.

    # Errors

    As [`GridEvaluator::log_posterior`] and [`DensityGrid::from_log_density`].
    */
    pub fn evaluate<P, L>(&self, posterior: &Posterior<P, L>) -> Result<DensityGrid>
    where
        P: LogPrior + Sync,
        L: LogLikelihood + Sync,
    {
        let log_density = self.log_posterior(posterior)?;
        let mut grid =
            DensityGrid::from_log_density(self.intercepts.values(), self.slopes.values(), log_density)?;
        if posterior.observations.is_empty() {
            warn!("no observations: posterior grid reflects the prior only");
            grid.prior_only = true;
        }
        Ok(grid)
    }
}

/// Shorthand for `GridEvaluator::new(intercepts, slopes).evaluate(posterior)`.
pub fn evaluate_grid<P, L>(
    posterior: &Posterior<P, L>,
    intercepts: ParamRange,
    slopes: ParamRange,
) -> Result<DensityGrid>
where
    P: LogPrior + Sync,
    L: LogLikelihood + Sync,
{
    GridEvaluator::new(intercepts, slopes).evaluate(posterior)
}
