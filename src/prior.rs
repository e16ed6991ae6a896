/*!
Log-priors over the line parameters `(intercept, slope[, scatter])`.

Two variants are provided through [`Prior`]:

- [`Prior::Flat`]: uniform inside `|theta_i| < bound`;
- [`Prior::Symmetric`]: uniform in the *angle* of the line, i.e. a slope density
  proportional to `(1 + slope²)^(-3/2)`, with the intercept bounded as above.

Any closure `Fn(&[f64]) -> f64` can be used wherever a [`LogPrior`] is expected.

# Examples

```rust
use line_posterior::prior::{LogPrior, Prior};

let flat = Prior::flat();
assert_eq!(flat.log_prior(&[999.0, 5.0]), 0.0);
assert_eq!(flat.log_prior(&[1001.0, 5.0]), f64::NEG_INFINITY);

let symmetric = Prior::symmetric();
assert!((symmetric.log_prior(&[0.0, 1.0]) + 1.5 * 2f64.ln()).abs() < 1e-12);
```
*/

/// Default hard bound on the absolute value of every parameter.
pub const DEFAULT_BOUND: f64 = 1000.0;

/// Log of an (unnormalized) prior density over a parameter vector.
///
/// Returning negative infinity marks a parameter vector outside the prior's support.
pub trait LogPrior {
    fn log_prior(&self, theta: &[f64]) -> f64;
}

impl<F> LogPrior for F
where
    F: Fn(&[f64]) -> f64,
{
    fn log_prior(&self, theta: &[f64]) -> f64 {
        self(theta)
    }
}

/// The prior variants used for the straight-line model.
///
/// Parameter vectors are ordered `(intercept, slope)` with an optional third entry for
/// the intrinsic scatter, which must lie in `(0, bound)` under both variants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prior {
    /// Zero log-density when every `|theta_i| < bound`, negative infinity otherwise.
    /// The bound itself is excluded.
    Flat { bound: f64 },
    /// `-1.5 * ln(1 + slope²)` when `|intercept| < bound`, negative infinity otherwise.
    Symmetric { bound: f64 },
}

impl Prior {
    pub fn flat() -> Self {
        Prior::Flat {
            bound: DEFAULT_BOUND,
        }
    }

    pub fn symmetric() -> Self {
        Prior::Symmetric {
            bound: DEFAULT_BOUND,
        }
    }

    pub fn bound(&self) -> f64 {
        match *self {
            Prior::Flat { bound } | Prior::Symmetric { bound } => bound,
        }
    }
}

impl Default for Prior {
    fn default() -> Self {
        Prior::flat()
    }
}

impl LogPrior for Prior {
    fn log_prior(&self, theta: &[f64]) -> f64 {
        let bound = self.bound();
        if let Some(&scatter) = theta.get(2) {
            if !(scatter > 0.0 && scatter < bound) {
                return f64::NEG_INFINITY;
            }
        }
        match *self {
            Prior::Flat { .. } => {
                if theta.iter().all(|t| t.abs() < bound) {
                    0.0
                } else {
                    f64::NEG_INFINITY
                }
            }
            Prior::Symmetric { .. } => {
                let intercept = theta[0];
                let slope = theta[1];
                if intercept.abs() < bound {
                    -1.5 * slope.mul_add(slope, 1.0).ln()
                } else {
                    f64::NEG_INFINITY
                }
            }
        }
    }
}
