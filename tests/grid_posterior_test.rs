//! End-to-end checks of the grid posterior pipeline on synthetic straight-line data.

use line_posterior::config::{FitConfig, PriorKind};
use line_posterior::contour::contour_levels;
use line_posterior::data::make_data;
use line_posterior::grid::{evaluate_grid, ParamRange};
use line_posterior::likelihood::Likelihood;
use line_posterior::posterior::Posterior;
use line_posterior::prior::{LogPrior, Prior};

/// Index of the value in `axis` closest to `v`.
fn nearest(axis: &ndarray::Array1<f64>, v: f64) -> usize {
    axis.iter()
        .enumerate()
        .min_by(|a, b| (a.1 - v).abs().total_cmp(&(b.1 - v).abs()))
        .map(|(i, _)| i)
        .unwrap()
}

#[test]
fn tutorial_scenario_end_to_end() {
    let fit = FitConfig::default().run().unwrap();
    let grid = &fit.grid;

    let max = grid.density().iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(max, 1.0);
    assert!(!grid.is_prior_only());

    // With seed 42 the peak lands within one cell of the generating line.
    let (b, m) = grid.peak();
    let (db, dm) = grid.cell_widths();
    assert!((b - 25.0).abs() <= db, "peak intercept {b}, cell width {db}");
    assert!((m - 0.5).abs() <= dm, "peak slope {m}, cell width {dm}");

    // The grid argmax also approximates the exact mode (the weighted least-squares line).
    let (b_ls, m_ls) = fit.observations.least_squares().unwrap();
    assert!((b - b_ls).abs() <= 3.0 * db, "peak intercept {b} vs mode {b_ls}");
    assert!((m - m_ls).abs() <= 3.0 * dm, "peak slope {m} vs mode {m_ls}");

    let levels = fit.levels;
    assert!(levels.one_sigma >= levels.two_sigma);
    assert!(levels.two_sigma >= levels.three_sigma);

    // The true line lies inside the 3-sigma credible region.
    let i = nearest(grid.intercepts(), 25.0);
    let j = nearest(grid.slopes(), 0.5);
    assert!(grid.density()[[i, j]] >= levels.three_sigma);
}

#[test]
fn large_sample_peak_recovers_truth() {
    let data = make_data(25.0, 0.5, 1000, 1.0, 0).unwrap();
    let posterior = Posterior::new(data, Prior::flat(), Likelihood::Gaussian);
    let grid = evaluate_grid(
        &posterior,
        ParamRange::new(20.0, 30.0, 21).unwrap(),
        ParamRange::new(0.45, 0.55, 201).unwrap(),
    )
    .unwrap();
    let (b, m) = grid.peak();
    assert!((b - 25.0).abs() <= 0.1, "intercept {b}");
    assert!((m - 0.5).abs() <= 0.1, "slope {m}");
}

#[test]
fn generator_is_deterministic() {
    for seed in [0, 1, 42, u64::MAX] {
        assert_eq!(
            make_data(25.0, 0.5, 20, 5.0, seed).unwrap(),
            make_data(25.0, 0.5, 20, 5.0, seed).unwrap()
        );
    }
    assert_ne!(
        make_data(25.0, 0.5, 20, 5.0, 1).unwrap(),
        make_data(25.0, 0.5, 20, 5.0, 2).unwrap()
    );
}

#[test]
fn prior_reference_values() {
    let flat = Prior::flat();
    assert_eq!(flat.log_prior(&[999.0, 5.0]), 0.0);
    assert_eq!(flat.log_prior(&[1001.0, 5.0]), f64::NEG_INFINITY);
    assert_eq!(flat.log_prior(&[1000.0, 5.0]), f64::NEG_INFINITY);

    let symmetric = Prior::symmetric();
    assert_eq!(symmetric.log_prior(&[0.0, 0.0]), 0.0);
    assert!((symmetric.log_prior(&[0.0, 1.0]) - (-1.5 * 2f64.ln())).abs() < 1e-12);
}

#[test]
fn priors_compare_on_identical_inputs() {
    let cmp = FitConfig::default().compare_priors().unwrap();
    for fit in [&cmp.flat, &cmp.symmetric] {
        let max = fit.grid.density().iter().cloned().fold(0.0, f64::max);
        assert_eq!(max, 1.0);
        assert!(fit.levels.one_sigma >= fit.levels.three_sigma);
    }
    // Twenty points dominate a weak prior: both peaks lie close together.
    let (bf, mf) = cmp.flat.grid.peak();
    let (bs, ms) = cmp.symmetric.grid.peak();
    let (db, dm) = cmp.flat.grid.cell_widths();
    assert!((bf - bs).abs() <= 2.0 * db);
    assert!((mf - ms).abs() <= 2.0 * dm);
}

#[test]
fn prior_only_grid_is_flagged() {
    let fit = FitConfig::default().n(0).prior(PriorKind::Symmetric).run().unwrap();
    assert!(fit.grid.is_prior_only());
    // The symmetric prior alone peaks at the smallest |slope| on the grid.
    let (_, m) = fit.grid.peak();
    assert_eq!(m, 0.3);
    assert!(contour_levels(fit.grid.density()).is_ok());
}
