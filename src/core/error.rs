//! Library-wide error structures.

/// Errors surfaced by simulation entry points and engine preprocessing.
///
/// Failures inside a single realization step that have a local recovery
/// (a singular kriging system, an under-populated neighborhood) are handled
/// where they occur and never reach this enum.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// A declared shape does not match: mean length vs variate count,
    /// variable count vs variate count, cosimulation partition mismatch.
    ShapeMismatch(String),
    /// The requested process/method combination is not supported.
    UnsupportedMethod(String),
    /// LU or FFT was asked to simulate a non-stationary function.
    NotStationary(String),
    /// A covariance matrix failed its Cholesky factorization.
    NotPositiveDefinite(String),
    /// Explicit-init source and destination index arrays differ in length.
    LengthMismatch(String),
    /// Async mode was requested with the calling worker in the pool.
    InvalidWorkerPool(String),
    /// A worker task failed while producing one realization.
    WorkerFailure {
        /// Realization slot the failure is attached to.
        index: usize,
        /// Underlying error message.
        message: String,
    },
}

impl std::fmt::Display for SimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ShapeMismatch(msg) => write!(f, "shape mismatch: {msg}"),
            Self::UnsupportedMethod(msg) => write!(f, "unsupported method: {msg}"),
            Self::NotStationary(msg) => write!(f, "not stationary: {msg}"),
            Self::NotPositiveDefinite(msg) => write!(f, "not positive definite: {msg}"),
            Self::LengthMismatch(msg) => write!(f, "length mismatch: {msg}"),
            Self::InvalidWorkerPool(msg) => write!(f, "invalid worker pool: {msg}"),
            Self::WorkerFailure { index, message } => {
                write!(f, "worker failure in realization {index}: {message}")
            }
        }
    }
}

impl std::error::Error for SimulationError {}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SimulationError>;
