//! Grid posterior of a straight-line fit under the flat and the symmetric prior, drawn
//! as 1/2/3-sigma contours.

use line_posterior::config::{FitConfig, GridFit};
use plotly::common::Mode;
use plotly::contour::{Coloring, Contours};
use plotly::{Contour, Layout, Plot, Scatter};
use std::error::Error;

#[cfg(feature = "csv")]
use line_posterior::io::csv::{save_density_grid, save_observations};

/// One contour trace per sigma level, each a single line at that density.
fn add_contours(plot: &mut Plot, fit: &GridFit, name: &str, color: &str) {
    let grid = &fit.grid;
    let (nb, nm) = grid.density().dim();
    // plotly expects z[row][col] with rows along y (slope).
    let z: Vec<Vec<f64>> = (0..nm)
        .map(|j| (0..nb).map(|i| grid.density()[[i, j]]).collect())
        .collect();
    for (level, sigma) in fit.levels.ascending().into_iter().zip([3, 2, 1]) {
        let trace = Contour::new(grid.intercepts().to_vec(), grid.slopes().to_vec(), z.clone())
            .name(&format!("{name} {sigma}σ"))
            .show_scale(false)
            .line(plotly::common::Line::new().color(color.to_string()))
            .contours(
                Contours::new()
                    .start(level)
                    .end(level)
                    .size(1.0)
                    .coloring(Coloring::Lines),
            );
        plot.add_trace(trace);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let config = FitConfig::default();
    let cmp = config.compare_priors()?;

    for (name, fit) in [("flat", &cmp.flat), ("symmetric", &cmp.symmetric)] {
        let (b, m) = fit.grid.peak();
        println!(
            "{name:>9}: peak intercept={b:.3} slope={m:.4} | levels 1σ={:.4} 2σ={:.4} 3σ={:.4}",
            fit.levels.one_sigma, fit.levels.two_sigma, fit.levels.three_sigma
        );
    }
    if let Some((b, m)) = cmp.flat.observations.least_squares() {
        println!("least squares: intercept={b:.3} slope={m:.4}");
    }

    let mut plot = Plot::new();
    add_contours(&mut plot, &cmp.flat, "flat", "rgb(70, 130, 180)");
    add_contours(&mut plot, &cmp.symmetric, "symmetric", "rgb(225, 87, 89)");
    let truth = Scatter::new(vec![config.data.intercept], vec![config.data.slope])
        .mode(Mode::Markers)
        .name("truth")
        .marker(plotly::common::Marker::new().size(10).color("black"));
    plot.add_trace(truth);

    let layout = Layout::new()
        .x_axis(plotly::layout::Axis::new().title("intercept"))
        .y_axis(plotly::layout::Axis::new().title("slope"))
        .show_legend(true)
        .width(800)
        .height(600);
    plot.set_layout(layout);
    plot.write_html("line_fit_grid.html");
    println!("Saved contour plot to line_fit_grid.html");

    #[cfg(feature = "csv")]
    {
        save_observations(&cmp.flat.observations, "line_fit_observations.csv")?;
        save_density_grid(&cmp.flat.grid, "line_fit_grid_flat.csv")?;
        save_density_grid(&cmp.symmetric.grid, "line_fit_grid_symmetric.csv")?;
        println!("Saved observations and grids as CSV.");
    }
    Ok(())
}
