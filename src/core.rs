/*!
# Core MCMC Utilities.

This module provides core functionality for running Markov Chain Monte Carlo (MCMC) chains in parallel.
It includes:
- The [`MarkovChain<T>`] trait, which abstracts a single MCMC chain.
- Utility functions [`run_chain`] and [`run_chain_progress`] for executing a single chain and collecting its states.
- The [`HasChains<T>`] trait for types that own multiple Markov chains.
- The [`ChainRunner<T>`] trait that extends [`HasChains<T>`] with methods to run chains in parallel (using Rayon), discarding burn-in and optionally displaying progress bars.
- [`init_around`] for dispersing starting positions around an initial guess.

Any type implementing [`HasChains<T>`] (with the required trait bounds) automatically implements [`ChainRunner<T>`] via a blanket implementation.
*/

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use ndarray::{stack, Array2, Array3, ArrayView1, ArrayView2, Axis, LinalgScalar, ShapeError};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rayon::prelude::*;
use std::time::{Duration, Instant};

/// A trait that abstracts a single MCMC chain.
pub trait MarkovChain<T> {
    /// Performs one iteration of the chain and returns a reference to the new state.
    fn step(&mut self) -> &Vec<T>;

    /// Returns a reference to the current state of the chain without advancing it.
    fn current_state(&self) -> &Vec<T>;
}

/// Runs a single chain for `n_discard + n_collect` steps and returns the last `n_collect`
/// states as the rows of an `[n_collect, dim]` array.
pub fn run_chain<T, M>(chain: &mut M, n_collect: usize, n_discard: usize) -> Array2<T>
where
    M: MarkovChain<T>,
    T: LinalgScalar,
{
    let dim = chain.current_state().len();
    let mut out = Array2::<T>::zeros((n_collect, dim));

    for i in 0..n_collect + n_discard {
        let state = chain.step();
        if i >= n_discard {
            out.row_mut(i - n_discard).assign(&ArrayView1::from(state.as_slice()));
        }
    }
    out
}

/**
Same as [`run_chain`], while updating `pb`.

The bar's message shows the running acceptance rate, counted as the fraction of steps
that changed the state. Updates are throttled to roughly every 500 milliseconds.
*/
pub fn run_chain_progress<T, M>(
    chain: &mut M,
    n_collect: usize,
    n_discard: usize,
    pb: &ProgressBar,
) -> Array2<T>
where
    M: MarkovChain<T>,
    T: LinalgScalar + PartialEq,
{
    const UPDATE_INTERVAL: Duration = Duration::from_millis(500);

    let dim = chain.current_state().len();
    let mut out = Array2::<T>::zeros((n_collect, dim));
    let total = n_collect + n_discard;
    let mut previous = chain.current_state().clone();
    let mut n_moved = 0_usize;
    let mut last_update = Instant::now();

    pb.set_length(total as u64);
    for i in 0..total {
        let state = chain.step();
        if *state != previous {
            n_moved += 1;
            previous.clone_from(state);
        }
        if i >= n_discard {
            out.row_mut(i - n_discard).assign(&ArrayView1::from(state.as_slice()));
        }
        if last_update.elapsed() >= UPDATE_INTERVAL || i + 1 == total {
            pb.set_position(i as u64 + 1);
            pb.set_message(format!("p(accept)≈{:.2}", n_moved as f64 / (i + 1) as f64));
            last_update = Instant::now();
        }
    }
    out
}

/// A trait for types that own multiple MCMC chains.
pub trait HasChains<T> {
    type Chain: MarkovChain<T> + Send;

    /// Returns a mutable reference to the vector of chains.
    fn chains_mut(&mut self) -> &mut Vec<Self::Chain>;
}

/// Runs every chain of a [`HasChains<T>`] in parallel.
///
/// Both methods return an [`Array3`] indexed by chain, step and parameter, with the first
/// `n_discard` steps of each chain dropped as burn-in.
pub trait ChainRunner<T>: HasChains<T>
where
    T: LinalgScalar + PartialEq + Send,
{
    fn run(&mut self, n_collect: usize, n_discard: usize) -> Result<Array3<T>, ShapeError> {
        let results: Vec<Array2<T>> = self
            .chains_mut()
            .par_iter_mut()
            .map(|chain| run_chain(chain, n_collect, n_discard))
            .collect();
        stack_chains(&results)
    }

    /// Like [`ChainRunner::run`], with one progress bar per chain.
    fn run_progress(&mut self, n_collect: usize, n_discard: usize) -> Result<Array3<T>, ShapeError> {
        let multi = MultiProgress::new();
        let pb_style = ProgressStyle::default_bar()
            .template("{prefix:8} {bar:40.cyan/blue} {pos}/{len} ({eta}) | {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");

        let results: Vec<Array2<T>> = self
            .chains_mut()
            .par_iter_mut()
            .enumerate()
            .map(|(i, chain)| {
                let pb = multi.add(ProgressBar::new((n_collect + n_discard) as u64));
                pb.set_prefix(format!("Chain {i}"));
                pb.set_style(pb_style.clone());
                let sample = run_chain_progress(chain, n_collect, n_discard, &pb);
                pb.finish_with_message("Done!");
                sample
            })
            .collect();
        stack_chains(&results)
    }
}

impl<T: LinalgScalar + PartialEq + Send, R: HasChains<T>> ChainRunner<T> for R {}

fn stack_chains<T: LinalgScalar>(results: &[Array2<T>]) -> Result<Array3<T>, ShapeError> {
    let views: Vec<ArrayView2<T>> = results.iter().map(|x| x.view()).collect();
    stack(Axis(0), &views)
}

/**
`n` starting positions, each `center` plus independent Gaussian noise with standard
deviation `scale`, drawn deterministically from `seed`.

# Examples

```rust
use line_posterior::core::init_around;

let positions = init_around(&[25.0, 0.5], 8, 1e-3, 42);
assert_eq!(positions.len(), 8);
assert!(positions.iter().all(|p| (p[0] - 25.0).abs() < 0.1));
```
*/
pub fn init_around(center: &[f64], n: usize, scale: f64, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            center
                .iter()
                .map(|&c| {
                    let z: f64 = rng.sample(StandardNormal);
                    c + scale * z
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts up by one on every step.
    struct Counter {
        state: Vec<f64>,
    }

    impl MarkovChain<f64> for Counter {
        fn step(&mut self) -> &Vec<f64> {
            self.state[0] += 1.0;
            &self.state
        }

        fn current_state(&self) -> &Vec<f64> {
            &self.state
        }
    }

    struct Counters {
        chains: Vec<Counter>,
    }

    impl HasChains<f64> for Counters {
        type Chain = Counter;

        fn chains_mut(&mut self) -> &mut Vec<Counter> {
            &mut self.chains
        }
    }

    #[test]
    fn run_chain_discards_burn_in() {
        let mut chain = Counter { state: vec![0.0, 7.0] };
        let out = run_chain(&mut chain, 3, 2);
        assert_eq!(out.dim(), (3, 2));
        assert_eq!(out.column(0).to_vec(), vec![3.0, 4.0, 5.0]);
        assert_eq!(out.column(1).to_vec(), vec![7.0, 7.0, 7.0]);
    }

    #[test]
    fn runner_stacks_chains() {
        let mut counters = Counters {
            chains: (0..3).map(|i| Counter { state: vec![10.0 * i as f64] }).collect(),
        };
        let sample = counters.run(4, 1).unwrap();
        assert_eq!(sample.shape(), &[3, 4, 1]);
        assert_eq!(sample[[2, 0, 0]], 22.0);
        assert_eq!(sample[[1, 3, 0]], 15.0);
    }

    #[test]
    fn progress_run_matches_plain_run() {
        let mut a = Counters {
            chains: vec![Counter { state: vec![0.0] }],
        };
        let mut b = Counters {
            chains: vec![Counter { state: vec![0.0] }],
        };
        let pb = ProgressBar::hidden();
        let with_bar = run_chain_progress(&mut a.chains[0], 5, 5, &pb);
        assert_eq!(with_bar, run_chain(&mut b.chains[0], 5, 5));
        assert_eq!(pb.position(), 10);
    }

    #[test]
    fn init_around_is_deterministic() {
        let a = init_around(&[1.0, 2.0, 3.0], 5, 0.1, 7);
        let b = init_around(&[1.0, 2.0, 3.0], 5, 0.1, 7);
        assert_eq!(a, b);
        assert_eq!(a[0].len(), 3);
        assert_ne!(a[0], a[1]);
    }
}
