//! Core domain types, process descriptors, options, and error structures.

pub(crate) mod error;
mod options;
mod process;
mod table;

pub use error::{Result, SimulationError};
pub use options::{
    DrawOptions, InitMethod, LuParams, Method, Neighborhood, PathKind, SeqParams, WorkerId,
};
pub use process::{
    ExternalProcess, GaussianProcess, IndicatorProcess, LindgrenProcess, Process,
};
pub use table::AttrTable;
