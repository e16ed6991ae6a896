/*!
One structure selecting everything a grid fit needs: the synthetic data, the grid
ranges and the prior variant.

[`FitConfig::run`] executes the whole pipeline (generate data, evaluate the posterior
grid, compute contour levels). [`FitConfig::compare_priors`] runs it with both prior
variants over identical observations and grids.

# Examples

```rust
use line_posterior::config::{FitConfig, PriorKind};

let fit = FitConfig::default().prior(PriorKind::Symmetric).seed(3).run().unwrap();
assert_eq!(fit.grid.density().dim(), (50, 50));
assert!(fit.levels.one_sigma >= fit.levels.three_sigma);
```
*/

use log::info;

use crate::contour::{contour_levels, ContourLevels};
use crate::data::{make_data, make_data_with_scatter, ObservationSet};
use crate::error::{PosteriorError, Result};
use crate::grid::{DensityGrid, GridEvaluator, ParamRange};
use crate::likelihood::Likelihood;
use crate::posterior::Posterior;
use crate::prior::Prior;

/// Which prior the grid is evaluated under, with the default bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriorKind {
    #[default]
    Flat,
    Symmetric,
}

impl PriorKind {
    pub fn prior(&self) -> Prior {
        match self {
            PriorKind::Flat => Prior::flat(),
            PriorKind::Symmetric => Prior::symmetric(),
        }
    }
}

/// Ground truth and noise of the synthetic observations.
#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub intercept: f64,
    pub slope: f64,
    pub n: usize,
    pub dy: f64,
    pub seed: u64,
    /// Intrinsic scatter added to the noise but not to the reported uncertainties.
    pub scatter: Option<f64>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            intercept: 25.0,
            slope: 0.5,
            n: 20,
            dy: 5.0,
            seed: 42,
            scatter: None,
        }
    }
}

impl DataConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.intercept.is_finite() && self.slope.is_finite()) {
            return Err(PosteriorError::InvalidConfig(format!(
                "true line must be finite, got intercept={} slope={}",
                self.intercept, self.slope
            )));
        }
        if !(self.dy.is_finite() && self.dy > 0.0) {
            return Err(PosteriorError::NonPositiveNoise(self.dy));
        }
        match self.scatter {
            Some(s) if !(s.is_finite() && s > 0.0) => Err(PosteriorError::NonPositiveNoise(s)),
            _ => Ok(()),
        }
    }

    /// Draws the observations described by this configuration.
    pub fn generate(&self) -> Result<ObservationSet> {
        match self.scatter {
            Some(scatter) => make_data_with_scatter(
                self.intercept,
                self.slope,
                scatter,
                self.n,
                self.dy,
                self.seed,
            ),
            None => make_data(self.intercept, self.slope, self.n, self.dy, self.seed),
        }
    }
}

/// Intercept and slope axes of the posterior grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    pub intercepts: ParamRange,
    pub slopes: ParamRange,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            intercepts: ParamRange::new(15.0, 35.0, 50).expect("default intercept range is valid"),
            slopes: ParamRange::new(0.3, 0.7, 50).expect("default slope range is valid"),
        }
    }
}

/// Data, grid and prior for a single grid fit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FitConfig {
    pub data: DataConfig,
    pub grid: GridConfig,
    pub prior: PriorKind,
}

/// Everything produced by [`FitConfig::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct GridFit {
    pub observations: ObservationSet,
    pub grid: DensityGrid,
    pub levels: ContourLevels,
}

/// Both prior variants evaluated over identical observations and grids.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorComparison {
    pub flat: GridFit,
    pub symmetric: GridFit,
}

impl FitConfig {
    /// Sets the true `(intercept, slope)` of the synthetic line.
    pub fn truth(mut self, intercept: f64, slope: f64) -> Self {
        self.data.intercept = intercept;
        self.data.slope = slope;
        self
    }

    pub fn n(mut self, n: usize) -> Self {
        self.data.n = n;
        self
    }

    pub fn dy(mut self, dy: f64) -> Self {
        self.data.dy = dy;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.data.seed = seed;
        self
    }

    pub fn scatter(mut self, scatter: f64) -> Self {
        self.data.scatter = Some(scatter);
        self
    }

    pub fn intercepts(mut self, range: ParamRange) -> Self {
        self.grid.intercepts = range;
        self
    }

    pub fn slopes(mut self, range: ParamRange) -> Self {
        self.grid.slopes = range;
        self
    }

    pub fn prior(mut self, prior: PriorKind) -> Self {
        self.prior = prior;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.data.validate()
    }

    /**
    Generates the observations, evaluates the posterior grid and computes its
    1/2/3-sigma contour levels.

    # Errors

    Any error from validation, data generation, grid evaluation or contour computation,
    e.g. [`PosteriorError::EmptyPosteriorGrid`] when the grid lies outside the prior.
    */
    pub fn run(&self) -> Result<GridFit> {
        self.validate()?;
        let observations = self.data.generate()?;
        self.fit(observations, self.prior)
    }

    /// Runs the pipeline once per prior variant on the same observations and grid.
    pub fn compare_priors(&self) -> Result<PriorComparison> {
        self.validate()?;
        let observations = self.data.generate()?;
        Ok(PriorComparison {
            flat: self.fit(observations.clone(), PriorKind::Flat)?,
            symmetric: self.fit(observations, PriorKind::Symmetric)?,
        })
    }

    fn fit(&self, observations: ObservationSet, prior: PriorKind) -> Result<GridFit> {
        let posterior = Posterior::new(observations, prior.prior(), Likelihood::Gaussian);
        let grid = GridEvaluator::new(self.grid.intercepts, self.grid.slopes).evaluate(&posterior)?;
        let levels = contour_levels(grid.density())?;
        let (b, m) = grid.peak();
        info!(
            "{prior:?} prior: peak at intercept={b:.3}, slope={m:.4}; levels {:.4}/{:.4}/{:.4}",
            levels.one_sigma, levels.two_sigma, levels.three_sigma
        );
        Ok(GridFit {
            observations: posterior.observations,
            grid,
            levels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reproduces_tutorial_scenario() {
        let config = FitConfig::default();
        assert_eq!(config.data.intercept, 25.0);
        assert_eq!(config.data.slope, 0.5);
        assert_eq!(config.data.n, 20);
        assert_eq!(config.data.dy, 5.0);
        assert_eq!(config.data.seed, 42);
        assert_eq!(config.grid.intercepts, ParamRange::new(15.0, 35.0, 50).unwrap());
        assert_eq!(config.grid.slopes, ParamRange::new(0.3, 0.7, 50).unwrap());
        assert_eq!(config.prior, PriorKind::Flat);
    }

    #[test]
    fn run_matches_manual_pipeline() {
        let fit = FitConfig::default().run().unwrap();
        assert_eq!(fit.observations, make_data(25.0, 0.5, 20, 5.0, 42).unwrap());
        let manual = crate::grid::evaluate_grid(
            &Posterior::new(fit.observations.clone(), Prior::flat(), Likelihood::Gaussian),
            ParamRange::new(15.0, 35.0, 50).unwrap(),
            ParamRange::new(0.3, 0.7, 50).unwrap(),
        )
        .unwrap();
        assert_eq!(fit.grid, manual);
        assert_eq!(fit.levels, contour_levels(manual.density()).unwrap());
    }

    #[test]
    fn compare_priors_share_inputs() {
        let cmp = FitConfig::default().compare_priors().unwrap();
        assert_eq!(cmp.flat.observations, cmp.symmetric.observations);
        assert_eq!(cmp.flat.grid.intercepts(), cmp.symmetric.grid.intercepts());
        assert_eq!(cmp.flat.grid.slopes(), cmp.symmetric.grid.slopes());
        // The symmetric prior tilts the density, so the grids differ.
        assert_ne!(cmp.flat.grid.density(), cmp.symmetric.grid.density());
    }

    #[test]
    fn invalid_noise_is_rejected() {
        assert!(matches!(
            FitConfig::default().dy(0.0).run(),
            Err(PosteriorError::NonPositiveNoise(_))
        ));
        assert!(matches!(
            FitConfig::default().scatter(-1.0).run(),
            Err(PosteriorError::NonPositiveNoise(_))
        ));
        assert!(matches!(
            FitConfig::default().truth(f64::NAN, 0.5).validate(),
            Err(PosteriorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn grid_outside_prior_is_an_error() {
        let far = ParamRange::new(2000.0, 3000.0, 10).unwrap();
        assert!(matches!(
            FitConfig::default().intercepts(far).run(),
            Err(PosteriorError::EmptyPosteriorGrid)
        ));
    }

    #[test]
    fn scatter_data_keep_reported_sigma() {
        let fit = FitConfig::default().scatter(10.0).run().unwrap();
        assert!(fit.observations.sigma().iter().all(|&s| s == 5.0));
    }

    #[test]
    fn empty_data_gives_prior_only_grid() {
        let fit = FitConfig::default().n(0).prior(PriorKind::Symmetric).run().unwrap();
        assert!(fit.grid.is_prior_only());
        assert_eq!(fit.observations.len(), 0);
    }
}
