use geosim::prelude::*;

#[test]
fn three_anchor_2d_simulation_hits_through_data() {
    let grid = CartesianGrid::with_geometry(vec![100, 100], vec![0.5, 0.5], vec![1.0, 1.0]);
    let domain = Domain::Grid(grid.clone());
    let func = GeoFunction::variogram(Kernel::Spherical, 35.0);
    let process = Process::Gaussian(GaussianProcess::univariate(func, 0.0));

    let data = AttrTable::from_points(
        PointSet::from(vec![vec![25.0, 25.0], vec![50.0, 75.0], vec![75.0, 50.0]]),
        vec![("Z".into(), vec![1.0, 0.0, 1.0])],
    )
    .unwrap();
    let options = DrawOptions::default()
        .with_data(data)
        .with_method(Method::Seq(SeqParams {
            max_neigh: 3,
            ..SeqParams::default()
        }));

    let ensemble = draw_many(2017, &process, &domain, 3, &options).unwrap();
    // Cell centroids sit at (i + 1, j + 1), so the anchors bind to
    // (24, 24), (49, 74), and (74, 49).
    let anchors = [
        (grid.linear_index(&[24, 24]), 1.0),
        (grid.linear_index(&[49, 74]), 0.0),
        (grid.linear_index(&[74, 49]), 1.0),
    ];
    for i in 0..ensemble.len() {
        let real = ensemble.get(i).unwrap();
        let z = real.column("Z").unwrap();
        assert_eq!(z.len(), 10_000);
        for &(cell, value) in &anchors {
            assert_eq!(z[cell], value, "realization {i}, cell {cell}");
        }
        assert!(z.iter().all(|v| v.is_finite()));
    }
}

#[test]
fn source_path_also_hits_through_data() {
    let domain = Domain::Grid(CartesianGrid::new(vec![40, 40]));
    let func = GeoFunction::variogram(Kernel::Spherical, 12.0);
    let process = Process::Gaussian(GaussianProcess::univariate(func, 0.0));
    let data = AttrTable::from_points(
        PointSet::from(vec![vec![5.5, 5.5], vec![30.5, 20.5]]),
        vec![("Z".into(), vec![2.0, -2.0])],
    )
    .unwrap();
    let options = DrawOptions::default()
        .with_data(data)
        .with_method(Method::Seq(SeqParams {
            path: PathKind::Source,
            ..SeqParams::default()
        }));

    let real = draw(99, &process, &domain, &options).unwrap();
    let z = real.column("Z").unwrap();
    let grid = CartesianGrid::new(vec![40, 40]);
    assert_eq!(z[grid.linear_index(&[5, 5])], 2.0);
    assert_eq!(z[grid.linear_index(&[30, 20])], -2.0);
}

#[test]
fn random_path_is_deterministic_per_seed() {
    let domain = Domain::Grid(CartesianGrid::new(vec![25, 25]));
    let func = GeoFunction::variogram(Kernel::Exponential, 8.0);
    let process = Process::Gaussian(GaussianProcess::univariate(func, 0.0));
    let options = DrawOptions::default().with_method(Method::Seq(SeqParams {
        path: PathKind::Random,
        ..SeqParams::default()
    }));

    let a = draw(31, &process, &domain, &options).unwrap();
    let b = draw(31, &process, &domain, &options).unwrap();
    assert_eq!(a.column("Z"), b.column("Z"));
}

#[test]
fn indicator_output_stays_in_the_category_alphabet() {
    let domain = Domain::Grid(CartesianGrid::new(vec![30, 30]));
    let func = GeoFunction::variogram(Kernel::Spherical, 10.0);
    let process = Process::Indicator(IndicatorProcess::new(func, vec![0.5, 0.3, 0.2]));

    let ensemble = draw_many(8, &process, &domain, 2, &DrawOptions::default()).unwrap();
    for i in 0..ensemble.len() {
        let real = ensemble.get(i).unwrap();
        let labels = real.column("I").unwrap();
        assert_eq!(labels.len(), 900);
        assert!(labels.iter().all(|&l| l == 1.0 || l == 2.0 || l == 3.0));
    }
}

#[test]
fn indicator_conditioning_reproduces_labels() {
    let domain = Domain::Grid(CartesianGrid::new(vec![20, 20]));
    let func = GeoFunction::variogram(Kernel::Spherical, 6.0);
    let process = Process::Indicator(IndicatorProcess::new(func, vec![0.6, 0.4]));
    let data = AttrTable::from_points(
        PointSet::from(vec![vec![3.5, 3.5], vec![15.5, 15.5]]),
        vec![("I".into(), vec![2.0, 1.0])],
    )
    .unwrap();
    let options = DrawOptions::default().with_data(data);

    let real = draw(4, &process, &domain, &options).unwrap();
    let labels = real.column("I").unwrap();
    let grid = CartesianGrid::new(vec![20, 20]);
    assert_eq!(labels[grid.linear_index(&[3, 3])], 2.0);
    assert_eq!(labels[grid.linear_index(&[15, 15])], 1.0);
}
