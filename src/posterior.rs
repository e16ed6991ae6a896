/*!
Log-posterior of the straight-line model: log-likelihood plus log-prior.

# Examples

```rust
use line_posterior::data::make_data;
use line_posterior::likelihood::Likelihood;
use line_posterior::posterior::Posterior;
use line_posterior::prior::Prior;

let data = make_data(25.0, 0.5, 20, 5.0, 42).unwrap();
let posterior = Posterior::new(data, Prior::flat(), Likelihood::Gaussian);
assert!(posterior.log_posterior(&[25.0, 0.5]).is_finite());
assert_eq!(posterior.log_posterior(&[2000.0, 0.5]), f64::NEG_INFINITY);
```
*/

use crate::data::ObservationSet;
use crate::distributions::Target;
use crate::likelihood::LogLikelihood;
use crate::prior::LogPrior;

/// Observations together with the prior and likelihood that turn them into a posterior.
#[derive(Debug, Clone)]
pub struct Posterior<P, L> {
    pub observations: ObservationSet,
    pub prior: P,
    pub likelihood: L,
}

impl<P, L> Posterior<P, L>
where
    P: LogPrior,
    L: LogLikelihood,
{
    pub fn new(observations: ObservationSet, prior: P, likelihood: L) -> Self {
        Self {
            observations,
            prior,
            likelihood,
        }
    }

    /// Length of the parameter vector the likelihood expects, if it declares one.
    pub fn n_params(&self) -> Option<usize> {
        self.likelihood.n_params()
    }

    /// `log_prior(theta) + log_likelihood(theta)`. The likelihood is skipped when the
    /// prior rejects `theta`, which then yields negative infinity.
    ///
    /// A density cannot be infinite, so positive infinity from either term is reported
    /// as NaN (undefined) rather than as a rejection.
    pub fn log_posterior(&self, theta: &[f64]) -> f64 {
        let lp = self.prior.log_prior(theta);
        if lp == f64::NEG_INFINITY {
            return f64::NEG_INFINITY;
        }
        if !lp.is_finite() {
            return f64::NAN;
        }
        let total = lp + self.likelihood.log_likelihood(theta, &self.observations);
        if total == f64::INFINITY {
            f64::NAN
        } else {
            total
        }
    }
}

impl<P, L> Target<f64, f64> for Posterior<P, L>
where
    P: LogPrior,
    L: LogLikelihood,
{
    fn unnorm_log_prob(&self, theta: &[f64]) -> f64 {
        self.log_posterior(theta)
    }

    fn dim(&self) -> Option<usize> {
        self.n_params()
    }
}
