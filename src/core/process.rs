//! Process descriptors and their shared validation.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimulationError};
use crate::engines::FieldBackend;
use crate::functions::GeoFunction;

/// Gaussian field process with a mean per variate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianProcess {
    pub func: GeoFunction,
    pub mean: Vec<f64>,
}

impl GaussianProcess {
    pub fn new(func: GeoFunction, mean: Vec<f64>) -> Self {
        Self { func, mean }
    }

    pub fn univariate(func: GeoFunction, mean: f64) -> Self {
        Self {
            func,
            mean: vec![mean],
        }
    }
}

/// Categorical field process; `prob` is a point on the simplex with one
/// entry per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorProcess {
    pub func: GeoFunction,
    pub prob: Vec<f64>,
}

impl IndicatorProcess {
    pub fn new(func: GeoFunction, prob: Vec<f64>) -> Self {
        Self { func, prob }
    }
}

/// Lindgren/SPDE field process over meshes.
///
/// The descriptor is part of the uniform API; its simulation backend is a
/// plug-in implemented against mesh collaborators (`vertices`,
/// `laplace_matrix`, `measure_matrix`) that this crate's domain kinds do
/// not provide.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LindgrenProcess {
    pub range: f64,
    pub sill: f64,
}

/// Opaque descriptor for a third-party field back-end (image quilting,
/// Turing patterns, stratigraphy).
#[derive(Clone)]
pub struct ExternalProcess {
    pub name: String,
    pub backend: Arc<dyn FieldBackend>,
}

impl fmt::Debug for ExternalProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalProcess")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A spatial field process descriptor.
#[derive(Debug, Clone)]
pub enum Process {
    Gaussian(GaussianProcess),
    Indicator(IndicatorProcess),
    Lindgren(LindgrenProcess),
    External(ExternalProcess),
}

impl Process {
    /// Number of output variables the process declares.
    pub fn variate_count(&self) -> usize {
        match self {
            Self::Gaussian(p) => p.func.variate_count(),
            // Indicator output is a single category column.
            Self::Indicator(_) | Self::Lindgren(_) => 1,
            Self::External(p) => p.backend.schema().len(),
        }
    }

    /// Default output column names, used when no conditioning data supplies
    /// its own.
    pub fn default_schema(&self) -> Vec<String> {
        match self {
            Self::Gaussian(p) => {
                let k = p.func.variate_count();
                if k == 1 {
                    vec!["Z".to_string()]
                } else {
                    (1..=k).map(|j| format!("Z{j}")).collect()
                }
            }
            Self::Indicator(_) => vec!["I".to_string()],
            Self::Lindgren(_) => vec!["Z".to_string()],
            Self::External(p) => p.backend.schema(),
        }
    }

    /// Validates internal shape constraints before any preprocessing.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Gaussian(p) => {
                p.func.validate()?;
                if p.mean.len() != p.func.variate_count() {
                    return Err(SimulationError::ShapeMismatch(format!(
                        "mean has {} entries but the function has {} variates",
                        p.mean.len(),
                        p.func.variate_count()
                    )));
                }
                Ok(())
            }
            Self::Indicator(p) => {
                p.func.validate()?;
                if p.prob.is_empty() {
                    return Err(SimulationError::ShapeMismatch(
                        "indicator process needs at least one category".into(),
                    ));
                }
                let total = p.prob.iter().sum::<f64>();
                if p.prob.iter().any(|&q| q < 0.0) || (total - 1.0).abs() > 1.0e-8 {
                    return Err(SimulationError::ShapeMismatch(
                        "category probabilities must be non-negative and sum to one".into(),
                    ));
                }
                Ok(())
            }
            Self::Lindgren(p) => {
                if p.range <= 0.0 || p.sill <= 0.0 {
                    return Err(SimulationError::ShapeMismatch(
                        "Lindgren range and sill must be positive".into(),
                    ));
                }
                Ok(())
            }
            Self::External(_) => Ok(()),
        }
    }
}
