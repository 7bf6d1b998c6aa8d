//! GeoSim simulates spatial stochastic processes: field processes defined at
//! every location of a geospatial domain and point processes producing random
//! point patterns inside a region.
//!
//! The core is the Gaussian field-simulation engine with three
//! interchangeable algorithms behind one uniform entry point:
//! - **LU**: dense-covariance Cholesky simulation with exact conditioning and
//!   bivariate cosimulation, for small domains.
//! - **SEQ**: sequential simulation visiting cells along a path and kriging
//!   each cell on a local neighborhood, for everything else (and for
//!   indicator processes).
//! - **FFT**: spectral synthesis of white noise on regular grids, with
//!   kriging-residual conditioning (FFT-MA).
//!
//! References used across modules include:
//! - Alabert (1987) and Davis (1987) for LU simulation.
//! - Deutsch and Journel, *GSLIB* (2nd ed.), for sequential Gaussian and
//!   indicator simulation.
//! - Le Ravalec, Noetinger, and Hu (2000) for the FFT moving-average method.
//! - Lindgren, Rue, and Lindstrom (2011) for the SPDE backend contract.
//!
//! Numerical considerations:
//! - Every engine rescales domain, function, and neighborhoods to unit extent
//!   before factorizing covariance systems.
//! - Method auto-selection prefers FFT only while the correlation length
//!   stays under a third of the shortest grid side; beyond that spectral
//!   synthesis tiles visibly and sequential simulation takes over.
//! - Reproducibility is seed-based: realization `i` consumes a child stream
//!   derived from `(seed, i)`, so results are independent of worker count.
//!
//! # Feature Flags
//! - `parallel` (default): Rayon-powered scheduling of multi-realization
//!   calls over the worker pool.
//!
//! # Quick Start
//! Draw one realization of a Gaussian process on a grid:
//! ```rust
//! use geosim::prelude::*;
//!
//! let func = GeoFunction::covariance(Kernel::Spherical, 10.0);
//! let process = Process::Gaussian(GaussianProcess::univariate(func, 0.0));
//! let domain = Domain::Grid(CartesianGrid::new(vec![50]));
//!
//! let real = draw(123, &process, &domain, &DrawOptions::default()).unwrap();
//! assert_eq!(real.column("Z").unwrap().len(), 50);
//! ```
//!
//! Build an ensemble and reduce it:
//! ```rust
//! use geosim::prelude::*;
//!
//! let func = GeoFunction::covariance(Kernel::Spherical, 5.0);
//! let process = Process::Gaussian(GaussianProcess::univariate(func, 1.0));
//! let domain = Domain::Grid(CartesianGrid::new(vec![20]));
//!
//! let ensemble = draw_many(42, &process, &domain, 8, &DrawOptions::default()).unwrap();
//! let mean = ensemble.mean().unwrap();
//! assert_eq!(mean.column("Z").unwrap().len(), 20);
//! ```
//!
//! Sample a clustered point pattern:
//! ```rust
//! use geosim::geometry::BoundingBox;
//! use geosim::point::{sample_points, PointProcess};
//!
//! let region = BoundingBox::new(vec![0.0, 0.0], vec![100.0, 100.0]);
//! let process = PointProcess::thomas(0.01, 5.0, 2.0);
//! let pattern = sample_points(7, &process, &region);
//! assert!(pattern.points().iter().all(|p| region.contains(p)));
//! ```

pub mod binding;
pub mod core;
pub mod engines;
pub mod ensemble;
pub mod functions;
pub mod geometry;
pub mod math;
pub mod point;
pub mod search;
pub mod sim;

/// Common imports for ergonomic usage.
pub mod prelude {
    pub use crate::core::*;
    pub use crate::ensemble::Ensemble;
    pub use crate::functions::{FunctionForm, GeoFunction, Kernel, Structure};
    pub use crate::geometry::*;
    pub use crate::sim::{draw, draw_many};
}
