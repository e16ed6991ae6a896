use criterion::{black_box, criterion_group, criterion_main, Criterion};
use line_posterior::contour::contour_levels;
use line_posterior::data::make_data;
use line_posterior::grid::{evaluate_grid, ParamRange};
use line_posterior::likelihood::Likelihood;
use line_posterior::posterior::Posterior;
use line_posterior::prior::Prior;

fn bench_grid(c: &mut Criterion) {
    let data = make_data(25.0, 0.5, 20, 5.0, 42).unwrap();
    let posterior = Posterior::new(data, Prior::flat(), Likelihood::Gaussian);
    let intercepts = ParamRange::new(15.0, 35.0, 200).unwrap();
    let slopes = ParamRange::new(0.3, 0.7, 200).unwrap();

    c.bench_function("evaluate 200x200 grid", |b| {
        b.iter(|| evaluate_grid(black_box(&posterior), intercepts, slopes).unwrap())
    });

    let grid = evaluate_grid(&posterior, intercepts, slopes).unwrap();
    c.bench_function("contour levels 200x200", |b| {
        b.iter(|| contour_levels(black_box(grid.density())).unwrap())
    });
}

criterion_group!(benches, bench_grid);
criterion_main!(benches);
