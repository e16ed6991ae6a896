/*!
Synthetic straight-line observations.

An [`ObservationSet`] holds `N` triples `(x, y, sigma)`. [`make_data`] draws `x`
uniformly from `[0, 100)` and adds Gaussian noise to `intercept + slope * x`;
[`make_data_with_scatter`] widens that noise by an intrinsic scatter the reported
`sigma` does not know about.

# Examples

```rust
use line_posterior::data::make_data;

let data = make_data(25.0, 0.5, 20, 5.0, 42).unwrap();
assert_eq!(data.len(), 20);
assert!(data.sigma().iter().all(|&s| s == 5.0));
```
*/

use ndarray::Array1;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{StandardNormal, Uniform};

use crate::error::{PosteriorError, Result};

/// Upper end (exclusive) of the interval `x` is drawn from.
pub const X_MAX: f64 = 100.0;

/// An immutable set of observations `(x, y, sigma)` with strictly positive `sigma`.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationSet {
    x: Array1<f64>,
    y: Array1<f64>,
    sigma: Array1<f64>,
}

impl ObservationSet {
    /// Builds an observation set, checking that the columns line up, every value is
    /// finite and every uncertainty is strictly positive.
    pub fn new(x: Vec<f64>, y: Vec<f64>, sigma: Vec<f64>) -> Result<Self> {
        if x.len() != y.len() || y.len() != sigma.len() {
            return Err(PosteriorError::LengthMismatch {
                x: x.len(),
                y: y.len(),
                sigma: sigma.len(),
            });
        }
        for (index, ((xi, yi), si)) in x.iter().zip(&y).zip(&sigma).enumerate() {
            if !(xi.is_finite() && yi.is_finite() && si.is_finite()) {
                return Err(PosteriorError::NonFiniteObservation { index });
            }
            if *si <= 0.0 {
                return Err(PosteriorError::NonPositiveUncertainty { index, sigma: *si });
            }
        }
        Ok(Self {
            x: Array1::from_vec(x),
            y: Array1::from_vec(y),
            sigma: Array1::from_vec(sigma),
        })
    }

    /// An observation set without observations.
    pub fn empty() -> Self {
        Self {
            x: Array1::zeros(0),
            y: Array1::zeros(0),
            sigma: Array1::zeros(0),
        }
    }

    pub fn x(&self) -> &Array1<f64> {
        &self.x
    }

    pub fn y(&self) -> &Array1<f64> {
        &self.y
    }

    pub fn sigma(&self) -> &Array1<f64> {
        &self.sigma
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Iterates over `(x, y, sigma)` triples in order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.x
            .iter()
            .zip(self.y.iter())
            .zip(self.sigma.iter())
            .map(|((&x, &y), &s)| (x, y, s))
    }

    /**
    Weighted least-squares `(intercept, slope)` with weights `1 / sigma²`.

    Under the flat prior this is the exact posterior mode as long as it lies inside the
    prior bound. Returns `None` for fewer than two observations or when all `x` coincide.
    */
    pub fn least_squares(&self) -> Option<(f64, f64)> {
        if self.len() < 2 {
            return None;
        }
        let (mut s, mut sx, mut sy, mut sxx, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for (x, y, sigma) in self.iter() {
            let w = 1.0 / (sigma * sigma);
            s += w;
            sx += w * x;
            sy += w * y;
            sxx += w * x * x;
            sxy += w * x * y;
        }
        let det = s * sxx - sx * sx;
        if det.abs() <= f64::EPSILON * s * sxx {
            return None;
        }
        let intercept = (sxx * sy - sx * sxy) / det;
        let slope = (s * sxy - sx * sy) / det;
        Some((intercept, slope))
    }
}

/**
Draws `n` noisy observations of the line `intercept + slope * x`.

`x` is uniform on `[0, 100)`; `y` gets zero-mean Gaussian noise with standard deviation
`dy`, and every reported `sigma` equals `dy`. The same arguments always produce
bit-identical output.

# Errors

[`PosteriorError::NonPositiveNoise`] if `dy` is not strictly positive and finite.
`n == 0` is allowed and yields an empty set.
*/
pub fn make_data(intercept: f64, slope: f64, n: usize, dy: f64, seed: u64) -> Result<ObservationSet> {
    check_scale(dy)?;
    Ok(generate(intercept, slope, n, dy, dy, seed))
}

/**
Like [`make_data`], but the actual noise has standard deviation
`sqrt(dy² + scatter²)` while the reported `sigma` stays `dy`.

# Examples

```rust
use line_posterior::data::make_data_with_scatter;

let data = make_data_with_scatter(25.0, 0.5, 10.0, 50, 5.0, 7).unwrap();
assert!(data.sigma().iter().all(|&s| s == 5.0));
```
*/
pub fn make_data_with_scatter(
    intercept: f64,
    slope: f64,
    scatter: f64,
    n: usize,
    dy: f64,
    seed: u64,
) -> Result<ObservationSet> {
    check_scale(dy)?;
    check_scale(scatter)?;
    let noise = dy.hypot(scatter);
    Ok(generate(intercept, slope, n, dy, noise, seed))
}

fn check_scale(value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PosteriorError::NonPositiveNoise(value))
    }
}

fn generate(intercept: f64, slope: f64, n: usize, dy: f64, noise: f64, seed: u64) -> ObservationSet {
    let mut rng = SmallRng::seed_from_u64(seed);
    let x: Array1<f64> = (&mut rng).sample_iter(Uniform::new(0.0, X_MAX)).take(n).collect();
    let y: Array1<f64> = x
        .iter()
        .map(|&xi| {
            let z: f64 = rng.sample(StandardNormal);
            intercept + slope * xi + noise * z
        })
        .collect();
    ObservationSet {
        x,
        y,
        sigma: Array1::from_elem(n, dy),
    }
}
