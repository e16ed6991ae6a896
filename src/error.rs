//! Error type shared by every fallible operation in the crate.

use thiserror::Error;

/// Errors raised while building observations, evaluating posterior grids, computing
/// contour levels or sampling.
///
/// A parameter vector outside the prior's support is *not* an error: priors return
/// negative infinity for it.
#[derive(Debug, Error)]
pub enum PosteriorError {
    /// An observation carries a zero or negative measurement uncertainty.
    #[error("non-positive uncertainty {sigma} at observation {index}")]
    NonPositiveUncertainty { index: usize, sigma: f64 },

    /// A noise scale or intrinsic scatter handed to the data generator is not strictly positive.
    #[error("non-positive uncertainty: {0}")]
    NonPositiveNoise(f64),

    /// An observation contains NaN or an infinite value.
    #[error("non-finite value in observation {index}")]
    NonFiniteObservation { index: usize },

    /// The x, y and sigma columns have different lengths.
    #[error("observation columns differ in length: x={x}, y={y}, sigma={sigma}")]
    LengthMismatch { x: usize, y: usize, sigma: usize },

    /// A parameter range cannot be turned into grid coordinates.
    #[error("invalid parameter range: {0}")]
    InvalidRange(String),

    /// Every grid cell lies outside the prior's support.
    #[error("posterior grid empty; widen parameter ranges")]
    EmptyPosteriorGrid,

    /// The log-posterior evaluated to NaN.
    #[error("log-posterior undefined at intercept={intercept}, slope={slope}")]
    UndefinedPosterior { intercept: f64, slope: f64 },

    /// A density grid without any cells.
    #[error("density grid is empty")]
    EmptyDensity,

    /// A density grid with a negative or non-finite cell.
    #[error("density grid contains a negative or non-finite value")]
    InvalidDensity,

    /// A density grid whose cells sum to zero.
    #[error("density grid has no probability mass")]
    ZeroMass,

    /// A requested credible mass outside `(0, 1]`.
    #[error("credible mass fraction {0} outside (0, 1]")]
    InvalidMassFraction(f64),

    /// Inconsistent configuration values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A sampler starting point where the posterior density is zero or undefined.
    #[error("initial position {index} has zero posterior density")]
    InvalidInitialPosition { index: usize },

    /// Too few chains or steps for a convergence diagnostic.
    #[error("need at least {needed_chains} chains of {needed_steps} steps, got {chains} x {steps}")]
    TooFewSamples {
        chains: usize,
        steps: usize,
        needed_chains: usize,
        needed_steps: usize,
    },

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    #[cfg(feature = "csv")]
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[cfg(feature = "csv")]
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias wrapping [`PosteriorError`].
pub type Result<T> = std::result::Result<T, PosteriorError>;
