/*!
# Metropolis–Hastings Sampler

This module implements a generic Metropolis–Hastings sampler that can work with any
target distribution `D` and proposal distribution `Q` that implement the corresponding
traits [`Target`] and [`Proposal`]. The sampler runs multiple independent Markov chains in parallel,
each started at its own initial position. A global seed is used to ensure reproducibility,
and each chain gets a unique seed by adding its index to the global seed.

## Overview

- **Target Distribution (`D`)**: Provides the (unnormalized) log-density for states via the [`Target`] trait.
  For line fits this is a [`Posterior`](crate::posterior::Posterior).
- **Proposal Distribution (`Q`)**: Generates candidate states and computes the proposal density via the [`Proposal`] trait.
- **Parallel Chains**: The sampler maintains a vector of [`MHMarkovChain`] instances, each evolving independently.
- **Reproducibility**: The method `set_seed` assigns a unique seed to each chain based on a given global seed.

## Example Usage

```rust
use line_posterior::data::make_data;
use line_posterior::distributions::IsotropicGaussian;
use line_posterior::likelihood::Likelihood;
use line_posterior::metropolis_hastings::MetropolisHastings;
use line_posterior::posterior::Posterior;
use line_posterior::prior::Prior;

let data = make_data(25.0, 0.5, 20, 5.0, 42).unwrap();
let target = Posterior::new(data, Prior::flat(), Likelihood::Gaussian);
let proposal = IsotropicGaussian::new(0.5);

let mh = MetropolisHastings::new(target, proposal, vec![vec![25.0, 0.5]; 4]).set_seed(7);
assert_eq!(mh.chains.len(), 4);
assert_eq!(mh.chains[3].seed, 10);
```

See also the documentation for [`MHMarkovChain`] and the methods below.
*/

use num_traits::Float;
use rand::prelude::*;
use std::marker::{PhantomData, Send};

use crate::core::{HasChains, MarkovChain};
use crate::distributions::{Proposal, Target};

/**
The Metropolis–Hastings sampler generates samples from a target distribution by
using a proposal distribution to propose candidate moves and then accepting or rejecting
these moves using the Metropolis–Hastings acceptance criterion.

# Type Parameters
- `S`: The element type for the state (typically a floating-point type).
- `T`: The floating-point type (e.g. `f32` or `f64`).
- `D`: The target distribution type. Must implement [`Target`].
- `Q`: The proposal distribution type. Must implement [`Proposal`].

The sampler maintains multiple independent Markov chains (each represented by [`MHMarkovChain`])
that are run in parallel. A global random seed is provided, and each chain's RNG and proposal
are seeded by adding the chain's index to the global seed, ensuring reproducibility.
*/
#[derive(Debug, Clone)]
pub struct MetropolisHastings<S: Clone, T: Float, D: Clone, Q: Clone> {
    /// The target distribution we want to sample from.
    pub target: D,
    /// The proposal distribution used to generate candidate states.
    pub proposal: Q,
    /// The vector of independent Markov chains.
    pub chains: Vec<MHMarkovChain<S, T, D, Q>>,
    /// The global random seed.
    pub seed: u64,
}

/// A single Markov chain for the Metropolis–Hastings algorithm.
///
/// Each chain stores its own copy of the target and proposal distributions,
/// maintains its current state and its log-density, and counts accepted moves.
#[derive(Debug, Clone)]
pub struct MHMarkovChain<S, T, D, Q> {
    /// The target distribution to sample from.
    pub target: D,
    /// The proposal distribution used to generate candidate states.
    pub proposal: Q,
    /// The current state of the chain.
    pub current_state: Vec<S>,
    /// The chain-specific random seed.
    pub seed: u64,
    /// The random number generator for this chain.
    pub rng: SmallRng,
    current_lp: T,
    n_steps: usize,
    n_accepted: usize,
    phantom: PhantomData<T>,
}

impl<S, T, D, Q> MetropolisHastings<S, T, D, Q>
where
    D: Target<S, T> + Clone + Send,
    Q: Proposal<S, T> + Clone + Send,
    T: Float + Send,
    S: Clone + PartialEq + Send + 'static,
    rand_distr::Standard: rand_distr::Distribution<T>,
{
    /**
    Constructs a new Metropolis-Hastings sampler with one chain per entry of
    `initial_positions`.

    # Arguments

    * `target` - The target distribution from which to sample.
    * `proposal` - The proposal distribution used to generate candidate states.
    * `initial_positions` - The starting state of every chain.
    */
    pub fn new(target: D, proposal: Q, initial_positions: Vec<Vec<S>>) -> Self {
        let chains = initial_positions
            .into_iter()
            .map(|start| MHMarkovChain::new(target.clone(), proposal.clone(), &start))
            .collect();
        let seed = thread_rng().gen::<u64>();

        Self {
            target,
            proposal,
            chains,
            seed,
        }
    }

    /**
    Sets a new global seed and updates the seed for each chain accordingly.

    Each chain receives a unique seed calculated as `seed + i` (wrapping), where `i` is the
    chain index.
    The seed drives both the acceptance draws and the chain's copy of the proposal.

    # Arguments

    * `seed` - The new global seed value.
    */
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        for (i, chain) in self.chains.iter_mut().enumerate() {
            let chain_seed = seed.wrapping_add(i as u64);
            chain.seed = chain_seed;
            chain.rng = SmallRng::seed_from_u64(chain_seed);
            chain.proposal = chain.proposal.clone().set_seed(chain_seed);
        }
        self
    }

    /// Fraction of accepted proposals, per chain.
    pub fn acceptance_fractions(&self) -> Vec<f64> {
        self.chains.iter().map(|c| c.acceptance_fraction()).collect()
    }
}

impl<S, T, D, Q> HasChains<S> for MetropolisHastings<S, T, D, Q>
where
    D: Target<S, T> + Clone + Send,
    Q: Proposal<S, T> + Clone + Send,
    T: Float + Send,
    S: Clone + PartialEq + Send + 'static,
    rand_distr::Standard: rand_distr::Distribution<T>,
{
    type Chain = MHMarkovChain<S, T, D, Q>;

    fn chains_mut(&mut self) -> &mut Vec<Self::Chain> {
        &mut self.chains
    }
}

impl<S, T, D, Q> MHMarkovChain<S, T, D, Q>
where
    D: Target<S, T> + Clone,
    Q: Proposal<S, T> + Clone,
    S: Clone + PartialEq,
    T: Float,
    rand_distr::Standard: rand_distr::Distribution<T>,
{
    /**
    Creates a new Metropolis–Hastings chain.

    # Arguments
    * `target` - The target distribution.
    * `proposal` - The proposal distribution.
    * `initial_state` - The starting state for the chain.
    */
    pub fn new(target: D, proposal: Q, initial_state: &[S]) -> Self {
        let seed = thread_rng().gen::<u64>();
        let current_lp = target.unnorm_log_prob(initial_state);
        Self {
            target,
            proposal,
            current_state: initial_state.to_vec(),
            seed,
            rng: SmallRng::seed_from_u64(seed),
            current_lp,
            n_steps: 0,
            n_accepted: 0,
            phantom: PhantomData,
        }
    }

    /// Log-density of the current state.
    pub fn current_log_prob(&self) -> T {
        self.current_lp
    }

    /// Accepted proposals over steps taken; zero before the first step.
    pub fn acceptance_fraction(&self) -> f64 {
        if self.n_steps == 0 {
            0.0
        } else {
            self.n_accepted as f64 / self.n_steps as f64
        }
    }
}

impl<S, T, D, Q> MarkovChain<S> for MHMarkovChain<S, T, D, Q>
where
    D: Target<S, T> + Clone,
    Q: Proposal<S, T> + Clone,
    S: Clone + PartialEq,
    T: Float,
    rand_distr::Standard: rand_distr::Distribution<T>,
{
    /**
    Performs one Metropolis–Hastings update step.

    A new candidate state is proposed using the proposal distribution, and the
    acceptance ratio in log-space is calculated as:

    \[
    \log \alpha = \left[\log p(\text{proposed}) + \log q(\text{current} \mid \text{proposed})\right]
                  - \left[\log p(\text{current}) + \log q(\text{proposed} \mid \text{current})\right]
    \]

    A uniform random number is drawn, and if \(\log(\text{Uniform}(0,1))\) is less than
    \(\log \alpha\), the proposed state is accepted. A candidate with negative infinite or
    NaN log-density is never accepted.
    */
    fn step(&mut self) -> &Vec<S> {
        self.n_steps += 1;
        let proposed: Vec<S> = self.proposal.sample(&self.current_state);
        let proposed_lp = self.target.unnorm_log_prob(&proposed);
        if proposed_lp.is_nan() || proposed_lp == T::neg_infinity() {
            return &self.current_state;
        }
        let log_q_forward = self.proposal.log_prob(&self.current_state, &proposed);
        let log_q_backward = self.proposal.log_prob(&proposed, &self.current_state);
        let log_accept_ratio = (proposed_lp + log_q_backward) - (self.current_lp + log_q_forward);
        let u: T = self.rng.gen();
        if log_accept_ratio > u.ln() {
            self.current_state = proposed;
            self.current_lp = proposed_lp;
            self.n_accepted += 1;
        }
        &self.current_state
    }

    fn current_state(&self) -> &Vec<S> {
        &self.current_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ChainRunner;
    use crate::distributions::IsotropicGaussian;
    use approx::assert_abs_diff_eq;
    use ndarray::Axis;

    /// Independent unit Gaussians centred at `mean`.
    #[derive(Clone)]
    struct StandardGaussian {
        mean: Vec<f64>,
    }

    impl Target<f64, f64> for StandardGaussian {
        fn unnorm_log_prob(&self, theta: &[f64]) -> f64 {
            -0.5 * theta
                .iter()
                .zip(&self.mean)
                .map(|(x, m)| (x - m).powi(2))
                .sum::<f64>()
        }
    }

    /// Unit Gaussian restricted to positive values.
    #[derive(Clone)]
    struct HalfGaussian;

    impl Target<f64, f64> for HalfGaussian {
        fn unnorm_log_prob(&self, theta: &[f64]) -> f64 {
            if theta[0] <= 0.0 {
                f64::NEG_INFINITY
            } else {
                -0.5 * theta[0] * theta[0]
            }
        }
    }

    fn run_gaussian_test(n_chains: usize, use_progress: bool) {
        let target = StandardGaussian {
            mean: vec![3.0, -1.0],
        };
        let proposal = IsotropicGaussian::new(1.0);
        let mut mh = MetropolisHastings::new(target, proposal, vec![vec![0.0, 0.0]; n_chains])
            .set_seed(42);
        let sample = if use_progress {
            mh.run_progress(20_000 / n_chains, 1_000).unwrap()
        } else {
            mh.run(20_000 / n_chains, 1_000).unwrap()
        };
        assert_eq!(sample.shape(), &[n_chains, 20_000 / n_chains, 2]);

        let flat = sample.into_shape_with_order((20_000, 2)).unwrap();
        let mean = flat.mean_axis(Axis(0)).unwrap();
        assert_abs_diff_eq!(mean[0], 3.0, epsilon = 0.15);
        assert_abs_diff_eq!(mean[1], -1.0, epsilon = 0.15);
        for frac in mh.acceptance_fractions() {
            assert!(frac > 0.2 && frac < 0.8, "acceptance {frac}");
        }
    }

    #[test]
    fn test_single_chain() {
        run_gaussian_test(1, false);
    }

    #[test]
    fn test_4_chains() {
        run_gaussian_test(4, false);
    }

    #[test]
    fn test_progress_4_chains() {
        run_gaussian_test(4, true);
    }

    #[test]
    fn seeding_is_reproducible() {
        let make = || {
            MetropolisHastings::new(
                StandardGaussian { mean: vec![0.0] },
                IsotropicGaussian::new(0.5),
                vec![vec![0.0]; 2],
            )
            .set_seed(11)
        };
        let a = make().run(200, 10).unwrap();
        let b = make().run(200, 10).unwrap();
        assert_eq!(a, b);
        // Chains with different seeds wander differently.
        assert_ne!(a.index_axis(Axis(0), 0), a.index_axis(Axis(0), 1));
    }

    #[test]
    fn chain_seeds_wrap_at_max() {
        let mh = MetropolisHastings::new(HalfGaussian, IsotropicGaussian::new(1.0), vec![vec![1.0]; 3])
            .set_seed(u64::MAX);
        let seeds: Vec<u64> = mh.chains.iter().map(|c| c.seed).collect();
        assert_eq!(seeds, vec![u64::MAX, 0, 1]);
    }

    #[test]
    fn never_leaves_support() {
        let mut mh = MetropolisHastings::new(HalfGaussian, IsotropicGaussian::new(2.0), vec![vec![0.5]])
            .set_seed(3);
        let sample = mh.run(5_000, 0).unwrap();
        assert!(sample.iter().all(|&x| x > 0.0));
        assert!(mh.chains[0].current_log_prob().is_finite());
    }

    #[test]
    fn acceptance_starts_at_zero() {
        let chain = MHMarkovChain::new(HalfGaussian, IsotropicGaussian::new(1.0), &[1.0]);
        assert_eq!(chain.acceptance_fraction(), 0.0);
        assert_eq!(chain.current_log_prob(), -0.5);
    }
}
