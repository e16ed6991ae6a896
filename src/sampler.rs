/*!
High-level entry point for sampling a posterior with parallel Metropolis-Hastings chains.

Given a log-posterior (any [`Target`]) and an initial guess, [`sample_posterior`]
disperses one starting position per chain in a small ball around the guess, runs the
chains in parallel and returns their traces as [`Chains`].

# Examples

```rust
use line_posterior::data::make_data;
use line_posterior::likelihood::Likelihood;
use line_posterior::posterior::Posterior;
use line_posterior::prior::Prior;
use line_posterior::sampler::{sample_posterior, SamplerConfig};

let data = make_data(25.0, 0.5, 20, 5.0, 42).unwrap();
let guess = data.least_squares().unwrap();
let posterior = Posterior::new(data, Prior::flat(), Likelihood::Gaussian);

let config = SamplerConfig::default()
    .n_chains(4)
    .n_collect(500)
    .n_discard(100)
    .proposal_std(0.05)
    .seed(1);
let chains = sample_posterior(posterior, &[guess.0, guess.1], &config).unwrap();
assert_eq!(chains.samples().shape(), &[4, 500, 2]);
```
*/

use log::{info, warn};
use ndarray::{Array1, Array2, Array3, Axis};

use crate::core::{init_around, ChainRunner};
use crate::distributions::{IsotropicGaussian, Target};
use crate::error::{PosteriorError, Result};
use crate::grid::{DensityGrid, ParamRange};
use crate::metropolis_hastings::MetropolisHastings;
use crate::stats;

/// Chains accepting fewer proposals than this are reported as poorly tuned.
pub const LOW_ACCEPTANCE: f64 = 0.1;

/// Settings for [`sample_posterior`].
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerConfig {
    /// Number of independent chains.
    pub n_chains: usize,
    /// Steps kept per chain.
    pub n_collect: usize,
    /// Burn-in steps dropped per chain.
    pub n_discard: usize,
    /// Standard deviation of the Gaussian random-walk proposal.
    pub proposal_std: f64,
    /// Spread of the starting positions around the guess.
    pub init_scale: f64,
    pub seed: u64,
    /// Show one progress bar per chain.
    pub progress: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            n_chains: 8,
            n_collect: 2_000,
            n_discard: 500,
            proposal_std: 0.1,
            init_scale: 1e-4,
            seed: 42,
            progress: false,
        }
    }
}

impl SamplerConfig {
    pub fn n_chains(mut self, n_chains: usize) -> Self {
        self.n_chains = n_chains;
        self
    }

    pub fn n_collect(mut self, n_collect: usize) -> Self {
        self.n_collect = n_collect;
        self
    }

    pub fn n_discard(mut self, n_discard: usize) -> Self {
        self.n_discard = n_discard;
        self
    }

    pub fn proposal_std(mut self, proposal_std: f64) -> Self {
        self.proposal_std = proposal_std;
        self
    }

    pub fn init_scale(mut self, init_scale: f64) -> Self {
        self.init_scale = init_scale;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// # Errors
    ///
    /// [`PosteriorError::InvalidConfig`] for zero chains or steps, or a non-positive
    /// proposal width or initial spread.
    pub fn validate(&self) -> Result<()> {
        if self.n_chains == 0 {
            return Err(PosteriorError::InvalidConfig("n_chains must be positive".into()));
        }
        if self.n_collect == 0 {
            return Err(PosteriorError::InvalidConfig("n_collect must be positive".into()));
        }
        if !(self.proposal_std > 0.0 && self.proposal_std.is_finite()) {
            return Err(PosteriorError::InvalidConfig(format!(
                "proposal_std must be positive, got {}",
                self.proposal_std
            )));
        }
        if !(self.init_scale > 0.0 && self.init_scale.is_finite()) {
            return Err(PosteriorError::InvalidConfig(format!(
                "init_scale must be positive, got {}",
                self.init_scale
            )));
        }
        Ok(())
    }
}

/// Traces of a finished sampling run.
#[derive(Debug, Clone, PartialEq)]
pub struct Chains {
    samples: Array3<f64>,
    acceptance: Vec<f64>,
}

impl Chains {
    /// Samples shaped (chain, step, parameter), burn-in removed.
    pub fn samples(&self) -> &Array3<f64> {
        &self.samples
    }

    /// All chains concatenated into a (chain * step, parameter) array.
    pub fn flat(&self) -> Array2<f64> {
        let (c, n, d) = self.samples.dim();
        self.samples
            .to_shape((c * n, d))
            .map(|view| view.to_owned())
            .unwrap_or_else(|_| Array2::zeros((0, d)))
    }

    /// Fraction of accepted proposals of each chain, over burn-in and kept steps.
    pub fn acceptance_fraction(&self) -> &[f64] {
        &self.acceptance
    }

    /// Gelman-Rubin statistic per parameter; see [`stats::rhat`].
    pub fn rhat(&self) -> Result<Array1<f64>> {
        stats::rhat(self.samples.view())
    }

    /// Integrated autocorrelation time per parameter; see [`stats::integrated_autocorr_time`].
    pub fn autocorr_time(&self) -> Result<Array1<f64>> {
        stats::integrated_autocorr_time(self.samples.view())
    }

    /// Posterior mean of each parameter over all chains.
    pub fn mean(&self) -> Option<Array1<f64>> {
        self.flat().mean_axis(Axis(0))
    }

    /// Histogram of the sampled `(intercept, slope)` pairs; see [`DensityGrid::from_samples`].
    pub fn density_grid(&self, intercepts: ParamRange, slopes: ParamRange) -> Result<DensityGrid> {
        let flat = self.flat();
        if flat.ncols() < 2 {
            return Err(PosteriorError::InvalidConfig(
                "a density grid needs intercept and slope samples".into(),
            ));
        }
        DensityGrid::from_samples(flat.column(0), flat.column(1), intercepts, slopes)
    }
}

/**
Samples `target` with `config.n_chains` Metropolis-Hastings chains started around `guess`.

Chain `i` starts at `guess` plus Gaussian noise of width `config.init_scale` and is
seeded with `config.seed + i`, so equal inputs give identical traces.

# Errors

- [`PosteriorError::InvalidConfig`] if `config` fails [`SamplerConfig::validate`],
  `guess` is empty or its length differs from [`Target::dim`];
- [`PosteriorError::InvalidInitialPosition`] if the target has zero or undefined
  density at a starting position;
- [`PosteriorError::Shape`] if the chain traces cannot be stacked.
*/
pub fn sample_posterior<D>(target: D, guess: &[f64], config: &SamplerConfig) -> Result<Chains>
where
    D: Target<f64, f64> + Clone + Send,
{
    config.validate()?;
    if guess.is_empty() {
        return Err(PosteriorError::InvalidConfig("initial guess is empty".into()));
    }
    if let Some(dim) = target.dim().filter(|&d| d != guess.len()) {
        return Err(PosteriorError::InvalidConfig(format!(
            "initial guess has {} parameters, target expects {dim}",
            guess.len()
        )));
    }
    let positions = init_around(guess, config.n_chains, config.init_scale, config.seed);
    if let Some(index) = positions
        .iter()
        .position(|p| !target.unnorm_log_prob(p).is_finite())
    {
        return Err(PosteriorError::InvalidInitialPosition { index });
    }

    let proposal = IsotropicGaussian::new(config.proposal_std);
    let mut mh = MetropolisHastings::new(target, proposal, positions).set_seed(config.seed);
    let samples = if config.progress {
        mh.run_progress(config.n_collect, config.n_discard)?
    } else {
        mh.run(config.n_collect, config.n_discard)?
    };

    let acceptance = mh.acceptance_fractions();
    let mean_acceptance = acceptance.iter().sum::<f64>() / acceptance.len() as f64;
    info!(
        "sampled {} chains x {} steps ({} discarded), mean acceptance {:.3}",
        config.n_chains, config.n_collect, config.n_discard, mean_acceptance
    );
    for (i, &frac) in acceptance.iter().enumerate() {
        if frac < LOW_ACCEPTANCE {
            warn!("chain {i} accepted only {frac:.3} of proposals; consider a smaller proposal_std");
        }
    }

    Ok(Chains { samples, acceptance })
}
