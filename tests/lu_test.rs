use geosim::prelude::*;

fn spherical_process(mean: f64) -> Process {
    let func = GeoFunction::covariance(Kernel::Spherical, 10.0);
    Process::Gaussian(GaussianProcess::univariate(func, mean))
}

fn lu_options() -> DrawOptions {
    DrawOptions::default().with_method(Method::Lu(LuParams::default()))
}

fn pooled_stats(ensemble: &Ensemble, name: &str) -> (f64, f64) {
    let mut values = Vec::new();
    for i in 0..ensemble.len() {
        values.extend_from_slice(ensemble.get(i).unwrap().column(name).unwrap());
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0);
    (mean, variance)
}

fn sample_correlation(z1: &[f64], z2: &[f64]) -> f64 {
    let n = z1.len() as f64;
    let m1 = z1.iter().sum::<f64>() / n;
    let m2 = z2.iter().sum::<f64>() / n;
    let cov = z1
        .iter()
        .zip(z2.iter())
        .map(|(a, b)| (a - m1) * (b - m2))
        .sum::<f64>()
        / n;
    let s1 = (z1.iter().map(|v| (v - m1) * (v - m1)).sum::<f64>() / n).sqrt();
    let s2 = (z2.iter().map(|v| (v - m2) * (v - m2)).sum::<f64>() / n).sqrt();
    cov / (s1 * s2)
}

#[test]
fn univariate_unconditional_1d_matches_target_moments() {
    let domain = Domain::Grid(CartesianGrid::new(vec![100]));
    let ensemble = draw_many(123, &spherical_process(0.0), &domain, 100, &lu_options()).unwrap();

    let first = ensemble.get(0).unwrap();
    assert_eq!(first.column("Z").unwrap().len(), 100);

    let (mean, variance) = pooled_stats(&ensemble, "Z");
    assert!(mean.abs() < 0.3, "pooled mean {mean} drifted from 0");
    assert!(
        (variance - 1.0).abs() < 0.3,
        "pooled variance {variance} drifted from sill 1"
    );
}

#[test]
fn conditional_1d_reproduces_data_exactly_in_every_realization() {
    let domain = Domain::Grid(CartesianGrid::new(vec![100]));
    let data = AttrTable::from_points(
        PointSet::from(vec![vec![0.0], vec![25.0], vec![50.0], vec![75.0], vec![100.0]]),
        vec![("Z".into(), vec![0.0, 1.0, 0.0, 1.0, 0.0])],
    )
    .unwrap();
    let options = lu_options().with_data(data);

    let ensemble = draw_many(123, &spherical_process(0.0), &domain, 5, &options).unwrap();
    // Nearest binding: cell centroids sit at i + 0.5, equidistant ties take
    // the lower index, and location 100 snaps to the last cell.
    let bound = [(0usize, 0.0), (24, 1.0), (49, 0.0), (74, 1.0), (99, 0.0)];
    for i in 0..ensemble.len() {
        let real = ensemble.get(i).unwrap();
        let z = real.column("Z").unwrap();
        for &(cell, value) in &bound {
            assert_eq!(z[cell], value, "realization {i}, cell {cell}");
        }
    }
}

#[test]
fn bivariate_cosimulation_reaches_target_cross_correlation() {
    let func = GeoFunction::covariance(Kernel::Spherical, 10.0)
        .with_cross_sill(vec![vec![1.0, 0.95], vec![0.95, 1.0]]);
    let process = Process::Gaussian(GaussianProcess::new(func, vec![0.0, 0.0]));
    let domain = Domain::Grid(CartesianGrid::new(vec![500]));

    let ensemble = draw_many(7, &process, &domain, 5, &lu_options()).unwrap();

    let mut z1 = Vec::new();
    let mut z2 = Vec::new();
    for i in 0..ensemble.len() {
        let real = ensemble.get(i).unwrap();
        assert_eq!(real.column("Z1").unwrap().len(), 500);
        assert_eq!(real.column("Z2").unwrap().len(), 500);
        z1.extend_from_slice(real.column("Z1").unwrap());
        z2.extend_from_slice(real.column("Z2").unwrap());
    }

    let correlation = sample_correlation(&z1, &z2);
    assert!(
        (correlation - 0.95).abs() < 0.05,
        "sample correlation {correlation} missed 0.95"
    );
}

#[test]
fn explicit_correlation_parameter_wins_over_cross_sill() {
    let func = GeoFunction::covariance(Kernel::Spherical, 10.0)
        .with_cross_sill(vec![vec![1.0, 0.2], vec![0.2, 1.0]]);
    let process = Process::Gaussian(GaussianProcess::new(func, vec![0.0, 0.0]));
    let domain = Domain::Grid(CartesianGrid::new(vec![400]));
    let options = DrawOptions::default().with_method(Method::Lu(LuParams {
        correlation: Some(0.9),
    }));

    let real = draw(11, &process, &domain, &options).unwrap();
    let correlation =
        sample_correlation(real.column("Z1").unwrap(), real.column("Z2").unwrap());
    assert!(
        correlation > 0.7,
        "explicit rho=0.9 ignored, sample correlation {correlation}"
    );
}

#[test]
fn variogram_form_function_is_rejected_by_lu() {
    let func = GeoFunction::variogram(Kernel::Spherical, 10.0);
    let process = Process::Gaussian(GaussianProcess::univariate(func, 0.0));
    let domain = Domain::Grid(CartesianGrid::new(vec![50]));
    assert!(matches!(
        draw(1, &process, &domain, &lu_options()),
        Err(SimulationError::UnsupportedMethod(_))
    ));
}
