//! Dense pairwise covariance evaluation between element centroids.

use nalgebra::DMatrix;

use crate::functions::GeoFunction;
use crate::geometry::Point;

/// Covariance matrix of variate `j` between two centroid sets.
///
/// Entry `(a, b)` is `cov_j(|p_a - q_b|)`; variogram-form functions come out
/// in covariance units (`sill - gamma`).
pub fn pairwise(func: &GeoFunction, j: usize, a: &[Point], b: &[Point]) -> DMatrix<f64> {
    DMatrix::from_fn(a.len(), b.len(), |r, c| {
        func.cov(j, j, a[r].distance(&b[c]))
    })
}

/// Symmetric covariance matrix of variate `j` over one centroid set.
pub fn pairwise_sym(func: &GeoFunction, j: usize, pts: &[Point]) -> DMatrix<f64> {
    let n = pts.len();
    let mut m = DMatrix::zeros(n, n);
    for r in 0..n {
        m[(r, r)] = func.cov(j, j, 0.0);
        for c in (r + 1)..n {
            let v = func.cov(j, j, pts[r].distance(&pts[c]));
            m[(r, c)] = v;
            m[(c, r)] = v;
        }
    }
    m
}
