//! Convergence diagnostics for MCMC samples shaped (chain, step, parameter).

use ndarray::prelude::*;
use rustfft::{num_complex::Complex, FftPlanner};

use crate::error::{PosteriorError, Result};

/// Window constant of the self-consistent autocorrelation window.
pub const AUTOCORR_WINDOW: f64 = 5.0;

/**
Gelman-Rubin potential scale reduction factor of each parameter.

Values close to 1 indicate that the chains agree with each other; values well above 1
mean they have not yet mixed.

# Errors

[`PosteriorError::TooFewSamples`] unless there are at least 2 chains of 2 steps.
*/
pub fn rhat(sample: ArrayView3<f64>) -> Result<Array1<f64>> {
    let (n_chains, n_steps, _) = sample.dim();
    let too_few = || PosteriorError::TooFewSamples {
        chains: n_chains,
        steps: n_steps,
        needed_chains: 2,
        needed_steps: 2,
    };
    if n_chains < 2 || n_steps < 2 {
        return Err(too_few());
    }
    let n = n_steps as f64;
    let m = n_chains as f64;

    // chain x param
    let mean = sample.mean_axis(Axis(1)).ok_or_else(too_few)?;
    let mean_chain = mean.mean_axis(Axis(0)).ok_or_else(too_few)?;
    let between = (&mean - &mean_chain.insert_axis(Axis(0)))
        .pow2()
        .sum_axis(Axis(0))
        * (n / (m - 1.0));
    let sm2 = sample.var_axis(Axis(1), 1.0);
    let within = sm2.mean_axis(Axis(0)).ok_or_else(too_few)?;
    let var = &within * ((n - 1.0) / n) + between / n;
    Ok((var / within).sqrt())
}

/**
Integrated autocorrelation time of each parameter.

The normalized autocorrelation function is averaged over chains, and
`tau(M) = 1 + 2 * sum_{t=1..M} rho(t)` is summed up to the smallest window `M` with
`M >= AUTOCORR_WINDOW * tau(M)`. Without such a window the full chain length is used,
and the estimate should not be trusted.

A parameter that never changes has no defined autocorrelation and yields NaN.

# Errors

[`PosteriorError::TooFewSamples`] for fewer than 2 steps or no chains.
*/
pub fn integrated_autocorr_time(sample: ArrayView3<f64>) -> Result<Array1<f64>> {
    let (n_chains, n_steps, n_params) = sample.dim();
    if n_chains < 1 || n_steps < 2 {
        return Err(PosteriorError::TooFewSamples {
            chains: n_chains,
            steps: n_steps,
            needed_chains: 1,
            needed_steps: 2,
        });
    }

    let mut acf = Array2::<f64>::zeros((n_steps, n_params));
    for chain in sample.axis_iter(Axis(0)) {
        acf += &autocorr_fft(chain);
    }
    acf /= n_chains as f64;

    Ok(acf
        .axis_iter(Axis(1))
        .map(|rho| {
            let mut tau = 1.0;
            for (m, r) in rho.iter().enumerate().skip(1) {
                tau += 2.0 * r;
                if m as f64 >= AUTOCORR_WINDOW * tau {
                    break;
                }
            }
            tau
        })
        .collect())
}

/**
Normalized autocorrelation of each column of `sample` (`n` steps by `d` parameters),
computed via zero-padded FFT with `rustfft`. Row `t` holds lag `t`.
*/
fn autocorr_fft(sample: ArrayView2<f64>) -> Array2<f64> {
    let (n, d) = sample.dim();
    let mut planner = FftPlanner::new();

    // Next power of 2 >= 2*n - 1 for zero-padding to avoid wrap-around.
    let n_padded = (2 * n - 1).next_power_of_two();
    let fft = planner.plan_fft_forward(n_padded);
    let ffti = planner.plan_fft_inverse(n_padded);

    let out: Vec<f64> = sample
        .axis_iter(Axis(1))
        .flat_map(|traj| {
            let traj_mean = traj.sum() / n as f64;
            let mut x: Vec<Complex<f64>> = traj
                .iter()
                .map(|xi| Complex::new(xi - traj_mean, 0.0))
                .chain(std::iter::repeat(Complex::new(0.0, 0.0)).take(n_padded - n))
                .collect();
            fft.process(&mut x);
            x.iter_mut().for_each(|xi| *xi = Complex::new(xi.norm_sqr(), 0.0));
            ffti.process(&mut x);
            // rustfft does not normalize; the ratio to lag 0 cancels the scale.
            let acov0 = x[0].re;
            x.into_iter()
                .take(n)
                .map(move |xi| xi.re / acov0)
        })
        .collect();
    let out = Array2::from_shape_vec((d, n), out)
        .unwrap_or_else(|_| Array2::from_elem((d, n), f64::NAN));
    out.reversed_axes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use rand_distr::StandardNormal;
    use std::f64;

    /// Stacks per-step (chain x param) snapshots into a (chain, step, param) array.
    fn from_steps(steps: &[Array2<f64>]) -> Array3<f64> {
        let views: Vec<_> = steps.iter().map(|s| s.view()).collect();
        ndarray::stack(Axis(1), &views).unwrap()
    }

    #[test]
    fn rhat_matches_reference_values() {
        let step_0 = arr2(&[
            [0.0, 1.0, 0.0, 1.0],
            [1.0, 2.0, 0.0, 2.0],
            [0.0, 0.0, 0.0, 2.0],
        ]);
        let step_1 = arr2(&[
            [1.0, 2.0, 2.0, 0.0],
            [1.0, 1.0, 1.0, 1.0],
            [0.0, 1.0, 0.0, 0.0],
        ]);
        let rhat = rhat(from_steps(&[step_0, step_1]).view()).unwrap();
        let expected = array![f64::consts::SQRT_2, 1.08012345, 0.89442719, 0.8660254];
        assert_abs_diff_eq!(rhat, expected, epsilon = 1e-7);
    }

    #[test]
    fn rhat_second_reference() {
        let step_0 = arr2(&[
            [1.0, 0.0, 0.0, 1.0],
            [1.0, 0.0, 0.0, 1.0],
            [0.0, 1.0, 0.0, 2.0],
        ]);
        let step_1 = arr2(&[
            [1.0, 2.0, 0.0, 2.0],
            [1.0, 2.0, 0.0, 0.0],
            [2.0, 0.0, 1.0, 2.0],
        ]);
        let rhat = rhat(from_steps(&[step_0, step_1]).view()).unwrap();
        let expected = array![f64::consts::FRAC_1_SQRT_2, 0.74535599, 1.0, 1.5];
        assert_abs_diff_eq!(rhat, expected, epsilon = 1e-7);
    }

    #[test]
    fn rhat_needs_two_chains() {
        let sample = Array3::<f64>::zeros((1, 10, 2));
        assert!(matches!(
            rhat(sample.view()),
            Err(PosteriorError::TooFewSamples { chains: 1, .. })
        ));
    }

    #[test]
    fn rhat_needs_two_steps() {
        let sample = Array3::<f64>::zeros((3, 0, 2));
        assert!(matches!(
            rhat(sample.view()),
            Err(PosteriorError::TooFewSamples { chains: 3, steps: 0, .. })
        ));
    }

    fn ar1(phi: f64, n_chains: usize, n_steps: usize, seed: u64) -> Array3<f64> {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut out = Array3::<f64>::zeros((n_chains, n_steps, 1));
        for c in 0..n_chains {
            let mut x = 0.0;
            for t in 0..n_steps {
                let z: f64 = rng.sample(StandardNormal);
                x = phi * x + z;
                out[[c, t, 0]] = x;
            }
        }
        out
    }

    #[test]
    fn white_noise_has_unit_autocorr_time() {
        let sample = ar1(0.0, 4, 10_000, 1);
        let tau = integrated_autocorr_time(sample.view()).unwrap();
        assert_abs_diff_eq!(tau[0], 1.0, epsilon = 0.2);
    }

    #[test]
    fn ar1_autocorr_time() {
        // tau = (1 + phi) / (1 - phi) = 19
        let sample = ar1(0.9, 4, 50_000, 2);
        let tau = integrated_autocorr_time(sample.view()).unwrap();
        assert!(tau[0] > 15.0 && tau[0] < 23.0, "tau = {}", tau[0]);
    }

    #[test]
    fn fft_autocorr_starts_at_one() {
        let sample = ar1(0.5, 1, 257, 3);
        let acf = autocorr_fft(sample.index_axis(Axis(0), 0));
        assert_eq!(acf.dim(), (257, 1));
        assert_abs_diff_eq!(acf[[0, 0]], 1.0, epsilon = 1e-12);
        // Lag-1 autocorrelation of an AR(1) process is close to phi.
        assert_abs_diff_eq!(acf[[1, 0]], 0.5, epsilon = 0.2);
    }
}
