//! Samples the straight-line posterior with parallel Metropolis-Hastings chains and
//! compares the histogram contours with the grid evaluation.

use line_posterior::config::FitConfig;
use line_posterior::contour::contour_levels;
use line_posterior::likelihood::Likelihood;
use line_posterior::posterior::Posterior;
use line_posterior::prior::Prior;
use line_posterior::sampler::{sample_posterior, SamplerConfig};
use plotly::common::Mode;
use plotly::{Layout, Plot, Scatter};
use std::error::Error;

#[cfg(feature = "csv")]
use line_posterior::io::csv::save_chains;

fn main() -> Result<(), Box<dyn Error>> {
    let config = FitConfig::default();
    let observations = config.data.generate()?;
    let guess = observations
        .least_squares()
        .ok_or("need at least two distinct x values")?;
    let posterior = Posterior::new(observations, Prior::flat(), Likelihood::Gaussian);

    // The intercept-slope ridge is narrow in slope, so the random walk must take small steps.
    let sampler = SamplerConfig::default()
        .n_chains(8)
        .n_collect(20_000)
        .n_discard(2_000)
        .proposal_std(0.03)
        .progress(true);
    let chains = sample_posterior(posterior, &[guess.0, guess.1], &sampler)?;

    let mean = chains.mean().ok_or("no samples")?;
    println!("posterior mean: intercept={:.3} slope={:.4}", mean[0], mean[1]);
    println!("acceptance: {:?}", chains.acceptance_fraction());
    println!("R-hat: {:?}", chains.rhat()?);
    println!("autocorrelation time: {:?}", chains.autocorr_time()?);

    let hist = chains.density_grid(config.grid.intercepts, config.grid.slopes)?;
    let levels = contour_levels(hist.density())?;
    let exact = config.run()?;
    println!(
        "histogram levels {:.3}/{:.3}/{:.3}, grid levels {:.3}/{:.3}/{:.3}",
        levels.one_sigma,
        levels.two_sigma,
        levels.three_sigma,
        exact.levels.one_sigma,
        exact.levels.two_sigma,
        exact.levels.three_sigma
    );

    let flat = chains.flat();
    let thin = flat.nrows() / 5_000 + 1;
    let xs: Vec<f64> = flat.column(0).iter().step_by(thin).copied().collect();
    let ys: Vec<f64> = flat.column(1).iter().step_by(thin).copied().collect();
    let trace = Scatter::new(xs, ys)
        .mode(Mode::Markers)
        .name("MCMC samples")
        .marker(plotly::common::Marker::new().size(3).opacity(0.4));

    let layout = Layout::new()
        .x_axis(plotly::layout::Axis::new().title("intercept"))
        .y_axis(plotly::layout::Axis::new().title("slope"))
        .width(800)
        .height(600);
    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(layout);
    plot.write_html("line_fit_mcmc.html");
    println!("Saved scatter plot to line_fit_mcmc.html");

    #[cfg(feature = "csv")]
    {
        save_chains(chains.samples(), "line_fit_chains.csv")?;
        println!("Saved chains in file line_fit_chains.csv.");
    }
    Ok(())
}
