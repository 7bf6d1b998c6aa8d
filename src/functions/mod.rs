//! Stationary covariance/variogram function families.
//!
//! A [`GeoFunction`] is a sum of [`Structure`]s, each a normalized correlation
//! kernel with its own range and partial sill. The two dual forms are the
//! banded covariance `C(h)` (`C(0) = sill`, `C(inf) -> 0`) and the variogram
//! `gamma(h) = sill - C(h)`; pairwise evaluation always works in covariance
//! units regardless of form. An optional cross-sill matrix makes a function
//! multivariate under the intrinsic-correlation model: variates share one
//! correlation template, and the matrix entry `(j, k)` is the (cross) sill.
//!
//! Ranges follow the practical-range convention: kernels with unbounded
//! support (Gaussian, exponential) decay to 5% correlation at `h = range`.

pub mod kriging;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimulationError};

/// Normalized correlation kernel shapes (`1` at lag zero, decaying to `0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Kernel {
    Gaussian,
    Spherical,
    Exponential,
    Cubic,
    /// Pure discontinuity at the origin.
    Nugget,
}

impl Kernel {
    /// Correlation at lag `h` for a kernel with range `range`.
    pub fn correlation(self, h: f64, range: f64) -> f64 {
        if h <= 0.0 {
            return 1.0;
        }
        match self {
            Self::Nugget => 0.0,
            Self::Gaussian => {
                let u = h / range;
                (-3.0 * u * u).exp()
            }
            Self::Exponential => (-3.0 * h / range).exp(),
            Self::Spherical => {
                let u = h / range;
                if u >= 1.0 {
                    0.0
                } else {
                    1.0 - 1.5 * u + 0.5 * u * u * u
                }
            }
            Self::Cubic => {
                let u = h / range;
                if u >= 1.0 {
                    0.0
                } else {
                    let u2 = u * u;
                    let u3 = u2 * u;
                    let u5 = u3 * u2;
                    let u7 = u5 * u2;
                    1.0 - (7.0 * u2 - 8.75 * u3 + 3.5 * u5 - 0.75 * u7)
                }
            }
        }
    }
}

/// One additive component of a [`GeoFunction`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub kernel: Kernel,
    pub range: f64,
    pub sill: f64,
}

impl Structure {
    pub fn new(kernel: Kernel, range: f64, sill: f64) -> Self {
        Self {
            kernel,
            range,
            sill,
        }
    }
}

/// Which dual form the function was declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionForm {
    /// Banded form: `C(0) = sill`, decays to zero.
    Covariance,
    /// `gamma(h) = sill - C(h)`.
    Variogram,
}

/// A stationary, symmetric kernel family evaluated between points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoFunction {
    structures: Vec<Structure>,
    form: FunctionForm,
    cross_sill: Option<Vec<Vec<f64>>>,
}

impl GeoFunction {
    /// Single-structure covariance with unit sill.
    pub fn covariance(kernel: Kernel, range: f64) -> Self {
        Self {
            structures: vec![Structure::new(kernel, range, 1.0)],
            form: FunctionForm::Covariance,
            cross_sill: None,
        }
    }

    /// Single-structure variogram with unit sill.
    pub fn variogram(kernel: Kernel, range: f64) -> Self {
        Self {
            structures: vec![Structure::new(kernel, range, 1.0)],
            form: FunctionForm::Variogram,
            cross_sill: None,
        }
    }

    /// Replaces the primary structure's sill.
    pub fn with_sill(mut self, sill: f64) -> Self {
        self.structures[0].sill = sill;
        self
    }

    /// Appends a nugget component.
    pub fn with_nugget(mut self, nugget: f64) -> Self {
        self.structures.push(Structure::new(Kernel::Nugget, 0.0, nugget));
        self
    }

    /// Appends another structure (nested model).
    pub fn plus(mut self, structure: Structure) -> Self {
        self.structures.push(structure);
        self
    }

    /// Attaches a cross-sill matrix, making the function multivariate.
    ///
    /// The matrix must be square and symmetric; its diagonal carries the
    /// marginal sills and the correlation template is shared across variates.
    pub fn with_cross_sill(mut self, cross_sill: Vec<Vec<f64>>) -> Self {
        self.cross_sill = Some(cross_sill);
        self
    }

    pub fn form(&self) -> FunctionForm {
        self.form
    }

    pub fn structures(&self) -> &[Structure] {
        &self.structures
    }

    /// Total sill of the correlation template.
    pub fn sill(&self) -> f64 {
        self.structures.iter().map(|s| s.sill).sum()
    }

    /// Marginal sill of variate `j`.
    pub fn marginal_sill(&self, j: usize) -> f64 {
        match &self.cross_sill {
            Some(m) => m[j][j],
            None => self.sill(),
        }
    }

    pub fn cross_sill(&self) -> Option<&Vec<Vec<f64>>> {
        self.cross_sill.as_ref()
    }

    /// Cross-correlation between variates `j` and `k`.
    pub fn cross_correlation(&self, j: usize, k: usize) -> Option<f64> {
        let m = self.cross_sill.as_ref()?;
        let denom = (m[j][j] * m[k][k]).sqrt();
        (denom > 0.0).then(|| m[j][k] / denom)
    }

    /// Longest structure range (nugget components excluded).
    pub fn range(&self) -> f64 {
        self.structures
            .iter()
            .filter(|s| s.kernel != Kernel::Nugget)
            .map(|s| s.range)
            .fold(0.0, f64::max)
    }

    pub fn is_stationary(&self) -> bool {
        true
    }

    pub fn is_symmetric(&self) -> bool {
        true
    }

    /// Banded (covariance-form) functions decay to zero at large lags.
    pub fn is_banded(&self) -> bool {
        self.form == FunctionForm::Covariance
    }

    pub fn variate_count(&self) -> usize {
        self.cross_sill.as_ref().map_or(1, Vec::len)
    }

    /// Sill-normalized correlation at lag `h` (`1` at `h = 0`).
    pub fn correlation(&self, h: f64) -> f64 {
        let total = self.sill();
        if total <= 0.0 {
            return 0.0;
        }
        self.structures
            .iter()
            .map(|s| s.sill * s.kernel.correlation(h, s.range))
            .sum::<f64>()
            / total
    }

    /// Covariance between variates `j` and `k` at lag `h`.
    ///
    /// Variogram-form functions are converted internally (`sill - gamma`), so
    /// callers always receive covariance units.
    pub fn cov(&self, j: usize, k: usize, h: f64) -> f64 {
        let scale = match &self.cross_sill {
            Some(m) => m[j][k],
            None => self.sill(),
        };
        scale * self.correlation(h)
    }

    /// Variogram value at lag `h` for variate `j`.
    pub fn gamma(&self, j: usize, h: f64) -> f64 {
        self.marginal_sill(j) * (1.0 - self.correlation(h))
    }

    /// Scales all structure ranges by `alpha` (unit-extent rescaling).
    pub fn scale(&self, alpha: f64) -> Self {
        Self {
            structures: self
                .structures
                .iter()
                .map(|s| Structure::new(s.kernel, s.range * alpha, s.sill))
                .collect(),
            form: self.form,
            cross_sill: self.cross_sill.clone(),
        }
    }

    /// Validates sills, ranges, and the cross-sill matrix shape.
    pub fn validate(&self) -> Result<()> {
        if self.structures.is_empty() {
            return Err(SimulationError::ShapeMismatch(
                "function must have at least one structure".into(),
            ));
        }
        for s in &self.structures {
            if s.sill < 0.0 || !s.sill.is_finite() {
                return Err(SimulationError::ShapeMismatch(
                    "structure sills must be finite and non-negative".into(),
                ));
            }
            if s.kernel != Kernel::Nugget && (s.range <= 0.0 || !s.range.is_finite()) {
                return Err(SimulationError::ShapeMismatch(
                    "structure ranges must be finite and positive".into(),
                ));
            }
        }
        if let Some(m) = &self.cross_sill {
            let n = m.len();
            if n == 0 || m.iter().any(|row| row.len() != n) {
                return Err(SimulationError::ShapeMismatch(
                    "cross-sill matrix must be square and non-empty".into(),
                ));
            }
            for i in 0..n {
                if m[i][i] <= 0.0 {
                    return Err(SimulationError::ShapeMismatch(
                        "cross-sill diagonal must be positive".into(),
                    ));
                }
                for j in 0..n {
                    if (m[i][j] - m[j][i]).abs() > 1.0e-10 {
                        return Err(SimulationError::ShapeMismatch(
                            "cross-sill matrix must be symmetric".into(),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}
