//! Simulation options, method descriptors, and worker identities.

use serde::{Deserialize, Serialize};

use crate::core::table::AttrTable;
use crate::geometry::MetricBall;

/// How conditioning data is bound onto the simulation domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InitMethod {
    /// Write each data row into the nearest domain element; ties broken by
    /// lowest element index.
    Nearest,
    /// Copy `data[source[i]]` into `real[dest[i]]`. When `source` is omitted
    /// it defaults to `0..len(data)`.
    Explicit {
        source: Option<Vec<usize>>,
        dest: Vec<usize>,
    },
}

impl Default for InitMethod {
    fn default() -> Self {
        Self::Nearest
    }
}

/// Neighborhood specification for sequential simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Neighborhood {
    /// Pure k-nearest search.
    None,
    /// Metric ball with radius equal to the function range.
    AutoFromRange,
    /// Explicit (possibly anisotropic) metric ball.
    Ball(MetricBall),
}

/// Traversal order of a sequential simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathKind {
    /// Raster order over element indices.
    Linear,
    /// Expanding multigrid strides over a grid; raster fallback elsewhere.
    Dilation,
    /// Shuffle by the realization's child PRNG.
    Random,
    /// Ascending distance to the nearest conditioning datum.
    Source,
}

/// LU engine parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LuParams {
    /// Cross-correlation for bivariate cosimulation. When set, wins over the
    /// value derived from the function's cross-sill matrix.
    pub correlation: Option<f64>,
}

/// Sequential engine parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeqParams {
    pub path: PathKind,
    /// Below this many neighbors the cell draws from the prior.
    pub min_neigh: usize,
    /// At most this many previously simulated neighbors condition a draw.
    pub max_neigh: usize,
    pub neighborhood: Neighborhood,
}

impl Default for SeqParams {
    fn default() -> Self {
        Self {
            path: PathKind::Linear,
            min_neigh: 1,
            max_neigh: 26,
            neighborhood: Neighborhood::AutoFromRange,
        }
    }
}

/// Field-simulation algorithm selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Method {
    /// Dense lower-upper Gaussian simulation with exact conditioning.
    Lu(LuParams),
    /// Sequential simulation with per-cell neighborhood kriging.
    Seq(SeqParams),
    /// Spectral synthesis on regular grids.
    Fft,
}

impl Method {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lu(_) => "LU",
            Self::Seq(_) => "SEQ",
            Self::Fft => "FFT",
        }
    }
}

/// Identity of a worker in the scheduling pool.
///
/// `WorkerId::CALLER` is the thread issuing the draw call; async mode
/// requires a pool of other workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerId(pub usize);

impl WorkerId {
    pub const CALLER: WorkerId = WorkerId(0);
}

/// Options accepted by the simulation entry points.
#[derive(Debug, Clone)]
pub struct DrawOptions {
    /// Conditioning data; realizations reproduce it at bound locations.
    pub data: Option<AttrTable>,
    /// Algorithm override; `None` auto-selects per process and domain.
    pub method: Option<Method>,
    /// How `data` is bound onto the domain.
    pub init: InitMethod,
    /// Worker pool; defaults to the single calling worker.
    pub workers: Vec<WorkerId>,
    /// Return an ensemble whose slots resolve lazily on dedicated workers.
    pub async_mode: bool,
    /// Emit a progress event per completed realization.
    pub show_progress: bool,
    /// Abort the whole call on the first failed realization.
    pub fail_fast: bool,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            data: None,
            method: None,
            init: InitMethod::Nearest,
            workers: vec![WorkerId::CALLER],
            async_mode: false,
            show_progress: false,
            fail_fast: false,
        }
    }
}

impl DrawOptions {
    pub fn with_data(mut self, data: AttrTable) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_workers(mut self, workers: Vec<WorkerId>) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_async(mut self, async_mode: bool) -> Self {
        self.async_mode = async_mode;
        self
    }
}
