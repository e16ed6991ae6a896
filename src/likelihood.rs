//! Gaussian log-likelihoods of the straight-line model.

use std::f64::consts::PI;

use crate::data::ObservationSet;

/// Log of the likelihood of a parameter vector given a set of observations.
pub trait LogLikelihood {
    fn log_likelihood(&self, theta: &[f64], observations: &ObservationSet) -> f64;

    /// Length of the parameter vector this likelihood reads, if known.
    fn n_params(&self) -> Option<usize> {
        None
    }
}

impl<F> LogLikelihood for F
where
    F: Fn(&[f64], &ObservationSet) -> f64,
{
    fn log_likelihood(&self, theta: &[f64], observations: &ObservationSet) -> f64 {
        self(theta, observations)
    }
}

/// The deterministic linear predictor `theta[0] + theta[1] * x`.
#[inline]
pub fn line(theta: &[f64], x: f64) -> f64 {
    theta[1].mul_add(x, theta[0])
}

/**
Independent Gaussian measurement errors around the line.

Each observation contributes `-0.5 * (ln(2π σ²) + (y - line(x))² / σ²)`. With
[`Likelihood::IntrinsicScatter`] the variance is `σ² + theta[2]²`. An empty
observation set has log-likelihood 0.

# Examples

```rust
use line_posterior::data::ObservationSet;
use line_posterior::likelihood::{Likelihood, LogLikelihood};

let data = ObservationSet::new(vec![0.0], vec![1.0], vec![1.0]).unwrap();
let ll = Likelihood::Gaussian.log_likelihood(&[1.0, 0.0], &data);
assert!((ll + 0.5 * (2.0 * std::f64::consts::PI).ln()).abs() < 1e-12);
```
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Likelihood {
    /// Known per-point uncertainties only; theta is `(intercept, slope)`.
    #[default]
    Gaussian,
    /// Uncertainties combined in quadrature with an unknown scatter `theta[2]`.
    IntrinsicScatter,
}

impl LogLikelihood for Likelihood {
    fn n_params(&self) -> Option<usize> {
        Some(match self {
            Likelihood::Gaussian => 2,
            Likelihood::IntrinsicScatter => 3,
        })
    }

    fn log_likelihood(&self, theta: &[f64], observations: &ObservationSet) -> f64 {
        let extra_var = match self {
            Likelihood::Gaussian => 0.0,
            Likelihood::IntrinsicScatter => theta[2] * theta[2],
        };
        let sum: f64 = observations
            .iter()
            .map(|(x, y, sigma)| {
                let var = sigma.mul_add(sigma, extra_var);
                let resid = y - line(theta, x);
                (2.0 * PI * var).ln() + resid * resid / var
            })
            .sum();
        -0.5 * sum
    }
}
