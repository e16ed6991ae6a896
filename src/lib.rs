//! Bayesian straight-line fits: synthetic data, grid-evaluated posteriors, highest-density
//! contour levels and parallel Metropolis-Hastings sampling of the same posterior.

pub mod config;
pub mod contour;
pub mod core;
pub mod data;
pub mod distributions;
pub mod error;
pub mod grid;
pub mod io;
pub mod likelihood;
pub mod metropolis_hastings;
pub mod posterior;
pub mod prior;
pub mod sampler;
pub mod stats;

pub use error::{PosteriorError, Result};
