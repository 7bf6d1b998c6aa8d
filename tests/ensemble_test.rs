use approx::assert_relative_eq;
use geosim::ensemble::Ensemble;
use geosim::prelude::*;

#[test]
fn hand_built_ensemble_reductions() {
    let domain = Domain::Grid(CartesianGrid::new(vec![3, 3]));
    let tables = (1..=3)
        .map(|level| {
            AttrTable::from_columns(domain.clone(), vec![("Z".into(), vec![level as f64; 9])])
                .unwrap()
        })
        .collect();
    let ensemble = Ensemble::from_tables(domain, tables);

    let mean = ensemble.mean().unwrap();
    let variance = ensemble.variance().unwrap();
    let cdf = ensemble.cdf(1.0).unwrap();
    let median = ensemble.quantile(0.5).unwrap();

    for cell in 0..9 {
        assert_relative_eq!(mean.column("Z").unwrap()[cell], 2.0);
        assert_relative_eq!(variance.column("Z").unwrap()[cell], 1.0);
        assert_relative_eq!(cdf.column("Z").unwrap()[cell], 1.0 / 3.0);
        assert_relative_eq!(median.column("Z").unwrap()[cell], 2.0);
    }
}

#[test]
fn reductions_cover_every_variable() {
    let domain = Domain::Grid(CartesianGrid::new(vec![2]));
    let tables = (0..4)
        .map(|r| {
            AttrTable::from_columns(
                domain.clone(),
                vec![
                    ("A".into(), vec![r as f64, 0.0]),
                    ("B".into(), vec![1.0, r as f64 * 2.0]),
                ],
            )
            .unwrap()
        })
        .collect();
    let ensemble = Ensemble::from_tables(domain, tables);

    let mean = ensemble.mean().unwrap();
    assert_relative_eq!(mean.column("A").unwrap()[0], 1.5);
    assert_relative_eq!(mean.column("B").unwrap()[1], 3.0);
}

#[test]
fn quantile_interpolates_between_order_statistics() {
    let domain = Domain::Grid(CartesianGrid::new(vec![1]));
    let tables = [1.0, 2.0, 4.0, 8.0]
        .iter()
        .map(|&v| {
            AttrTable::from_columns(domain.clone(), vec![("Z".into(), vec![v])]).unwrap()
        })
        .collect();
    let ensemble = Ensemble::from_tables(domain, tables);

    assert_relative_eq!(ensemble.quantile(0.0).unwrap().column("Z").unwrap()[0], 1.0);
    assert_relative_eq!(ensemble.quantile(1.0).unwrap().column("Z").unwrap()[0], 8.0);
    // h = 3 * 0.5 = 1.5 -> halfway between 2 and 4.
    assert_relative_eq!(ensemble.quantile(0.5).unwrap().column("Z").unwrap()[0], 3.0);
}
