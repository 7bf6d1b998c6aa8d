//! Simple-kriging predictor over local neighborhoods or whole domains.
//!
//! Under the intrinsic-correlation model all variates share one correlation
//! template, so a single Cholesky factorization of the sample correlation
//! matrix serves every variate: the weights `lambda = R^-1 r` are common, and
//! per-variate means/variances follow from the marginal sills.

use nalgebra::{Cholesky, DMatrix, DVector, Dyn};

use crate::core::error::{Result, SimulationError};
use crate::functions::GeoFunction;
use crate::geometry::{Domain, Point};

/// Outcome of factorizing a kriging system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitStatus {
    Success,
    /// The sample correlation matrix is not positive definite (duplicate or
    /// near-duplicate locations). Callers recover by drawing from the prior.
    Singular,
}

/// Simple kriging with known means (or prior probabilities, for indicator
/// simulation, where each category is treated as a variate).
#[derive(Debug, Clone)]
pub struct Kriging {
    func: GeoFunction,
    means: Vec<f64>,
}

/// A factorized local system, ready for prediction at arbitrary targets.
pub struct KrigingFit {
    status: FitStatus,
    chol: Option<Cholesky<f64, Dyn>>,
    coords: Vec<Point>,
    /// `values[j][s]` is variate `j` at sample `s`.
    values: Vec<Vec<f64>>,
}

impl KrigingFit {
    pub fn status(&self) -> FitStatus {
        self.status
    }
}

impl Kriging {
    pub fn new(func: GeoFunction, means: Vec<f64>) -> Self {
        Self { func, means }
    }

    pub fn func(&self) -> &GeoFunction {
        &self.func
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Factorizes the correlation system for `coords`.
    ///
    /// `values[j]` holds variate `j` at each sample location and must have
    /// `coords.len()` entries.
    pub fn fit(&self, coords: &[Point], values: &[Vec<f64>]) -> KrigingFit {
        let n = coords.len();
        debug_assert!(values.iter().all(|v| v.len() == n));
        let r = DMatrix::<f64>::from_fn(n, n, |i, j| {
            if i == j {
                1.0
            } else {
                self.func.correlation(coords[i].distance(&coords[j]))
            }
        });
        match Cholesky::new(r) {
            Some(chol) => KrigingFit {
                status: FitStatus::Success,
                chol: Some(chol),
                coords: coords.to_vec(),
                values: values.to_vec(),
            },
            None => KrigingFit {
                status: FitStatus::Singular,
                chol: None,
                coords: Vec::new(),
                values: Vec::new(),
            },
        }
    }

    /// Posterior `(mean, variance)` per variate at `target`.
    ///
    /// Returns `None` when the fit is singular.
    pub fn predict(&self, fit: &KrigingFit, target: &Point) -> Option<Vec<(f64, f64)>> {
        let chol = fit.chol.as_ref()?;
        let n = fit.coords.len();
        let r = DVector::<f64>::from_fn(n, |i, _| {
            self.func.correlation(fit.coords[i].distance(target))
        });
        let lambda = chol.solve(&r);
        let shrink = lambda.dot(&r);

        Some(
            self.means
                .iter()
                .enumerate()
                .map(|(j, &m)| {
                    let residual = fit.values[j]
                        .iter()
                        .zip(lambda.iter())
                        .map(|(&z, &w)| w * (z - m))
                        .sum::<f64>();
                    let sill = self.func.marginal_sill(j);
                    let variance = (sill * (1.0 - shrink)).max(0.0);
                    (m + residual, variance)
                })
                .collect(),
        )
    }

    /// Posterior probabilities per category at `target`, clamped to `[0, 1]`.
    ///
    /// Renormalization is left to the caller, which also owns the prior
    /// fallback for degenerate cases.
    pub fn predict_prob(&self, fit: &KrigingFit, target: &Point) -> Option<Vec<f64>> {
        self.predict(fit, target)
            .map(|posterior| posterior.iter().map(|(m, _)| m.clamp(0.0, 1.0)).collect())
    }

    /// Fits to all data once and predicts the mean field over `domain`.
    ///
    /// Used for whole-grid conditioning; a singular global system is fatal
    /// here, unlike the per-cell fits of sequential simulation.
    pub fn fit_predict(
        &self,
        coords: &[Point],
        values: &[Vec<f64>],
        domain: &Domain,
    ) -> Result<Vec<Vec<f64>>> {
        let fit = self.fit(coords, values);
        if fit.status() == FitStatus::Singular {
            return Err(SimulationError::NotPositiveDefinite(
                "global conditioning kriging system is singular".into(),
            ));
        }
        let n = domain.element_count();
        let nvars = self.means.len();
        let mut fields = vec![vec![0.0; n]; nvars];
        for i in 0..n {
            let posterior = self
                .predict(&fit, &domain.centroid(i))
                .expect("fit succeeded");
            for (j, (m, _)) in posterior.into_iter().enumerate() {
                fields[j][i] = m;
            }
        }
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::Kernel;
    use approx::assert_relative_eq;

    fn sample_points() -> Vec<Point> {
        vec![
            Point::new(vec![0.0, 0.0]),
            Point::new(vec![4.0, 0.0]),
            Point::new(vec![0.0, 4.0]),
        ]
    }

    #[test]
    fn kriging_is_exact_at_data_locations() {
        let func = GeoFunction::covariance(Kernel::Spherical, 10.0);
        let kriging = Kriging::new(func, vec![0.0]);
        let coords = sample_points();
        let values = vec![vec![1.0, -0.5, 2.0]];
        let fit = kriging.fit(&coords, &values);
        assert_eq!(fit.status(), FitStatus::Success);

        for (s, coord) in coords.iter().enumerate() {
            let posterior = kriging.predict(&fit, coord).unwrap();
            assert_relative_eq!(posterior[0].0, values[0][s], epsilon = 1.0e-8);
            assert!(posterior[0].1 < 1.0e-8);
        }
    }

    #[test]
    fn far_target_reverts_to_prior() {
        let func = GeoFunction::covariance(Kernel::Spherical, 10.0).with_sill(2.0);
        let kriging = Kriging::new(func, vec![0.5]);
        let coords = sample_points();
        let values = vec![vec![1.0, -0.5, 2.0]];
        let fit = kriging.fit(&coords, &values);

        let posterior = kriging.predict(&fit, &Point::new(vec![100.0, 100.0])).unwrap();
        assert_relative_eq!(posterior[0].0, 0.5, epsilon = 1.0e-10);
        assert_relative_eq!(posterior[0].1, 2.0, epsilon = 1.0e-10);
    }

    #[test]
    fn duplicate_locations_are_singular() {
        let func = GeoFunction::covariance(Kernel::Gaussian, 10.0);
        let kriging = Kriging::new(func, vec![0.0]);
        let coords = vec![Point::new(vec![1.0, 1.0]), Point::new(vec![1.0, 1.0])];
        let values = vec![vec![1.0, 1.0]];
        let fit = kriging.fit(&coords, &values);
        assert_eq!(fit.status(), FitStatus::Singular);
        assert!(kriging.predict(&fit, &Point::new(vec![0.0, 0.0])).is_none());
    }
}
