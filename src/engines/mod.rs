//! Field-simulation engine implementations.
//!
//! Every engine splits its work into a `preprocess` step (run exactly once
//! per call, producing an immutable [`Artifact`]) and a `single` step (run
//! once per realization, consuming a child PRNG stream). The orchestrator
//! dispatches on the `(process, method)` pair.

pub mod fft;
pub mod lindgren;
pub mod lu;
pub mod seq;

use std::any::Any;

use crate::core::{
    AttrTable, InitMethod, LuParams, Method, PathKind, Process, Result, SeqParams, SimulationError,
};
use crate::geometry::Domain;

/// Opaque artifact produced by an external back-end.
pub type BackendArtifact = Box<dyn Any + Send + Sync>;

/// Plug-in contract for third-party field back-ends (image quilting, Turing
/// patterns, stratigraphy, Lindgren/SPDE).
pub trait FieldBackend: Send + Sync {
    /// Output variable names and implied types.
    fn schema(&self) -> Vec<String>;

    /// Engine-specific default when the caller does not pick a method.
    fn default_method(&self, domain: &Domain, data: Option<&AttrTable>) -> Method;

    /// Builds the immutable, shareable preprocessing artifact.
    fn preprocess(
        &self,
        seed: u64,
        method: &Method,
        init: &InitMethod,
        domain: &Domain,
        data: Option<&AttrTable>,
    ) -> Result<BackendArtifact>;

    /// Produces one realization from a child stream and the shared artifact.
    fn single(
        &self,
        child_seed: u64,
        method: &Method,
        domain: &Domain,
        artifact: &BackendArtifact,
    ) -> Result<AttrTable>;
}

/// Immutable preprocessing output, shared read-only across workers.
pub enum Artifact {
    Lu(lu::LuArtifact),
    Seq(seq::SeqArtifact),
    Fft(fft::FftArtifact),
    External(BackendArtifact),
}

/// Output column names: conditioning data supplies them when present,
/// otherwise the process's default schema applies.
pub fn output_names(process: &Process, data: Option<&AttrTable>) -> Vec<String> {
    match data {
        Some(table) if table.column_count() > 0 => table.names().map(str::to_string).collect(),
        _ => process.default_schema(),
    }
}

/// Method auto-selection: FFT for short-range unconditional grids, LU for
/// small banded problems, sequential otherwise (with a source-driven path
/// for non-Gaussian processes holding data).
pub fn default_method(process: &Process, domain: &Domain, data: Option<&AttrTable>) -> Method {
    match process {
        Process::Gaussian(p) => {
            let on_grid = domain.parent_grid().is_some();
            let univariate = p.func.variate_count() == 1;
            let min_side = domain.bounding_box().min_side();
            if on_grid
                && p.func.is_stationary()
                && univariate
                && p.func.range() <= min_side / 3.0
                && data.is_none()
            {
                Method::Fft
            } else if domain.element_count() < 10_000
                && p.func.is_stationary()
                && p.func.is_symmetric()
                && p.func.is_banded()
            {
                Method::Lu(LuParams::default())
            } else {
                Method::Seq(SeqParams::default())
            }
        }
        Process::Indicator(_) | Process::Lindgren(_) => {
            let path = if data.is_some() {
                PathKind::Source
            } else {
                PathKind::Linear
            };
            Method::Seq(SeqParams {
                path,
                ..SeqParams::default()
            })
        }
        Process::External(p) => p.backend.default_method(domain, data),
    }
}

/// Runs the engine-specific preprocess for `(process, method)`.
pub fn preprocess(
    seed: u64,
    process: &Process,
    method: &Method,
    init: &InitMethod,
    domain: &Domain,
    data: Option<&AttrTable>,
) -> Result<Artifact> {
    process.validate()?;
    let names = output_names(process, data);
    match (process, method) {
        (Process::Gaussian(p), Method::Lu(params)) => {
            lu::preprocess(p, params, init, domain, data, names).map(Artifact::Lu)
        }
        (Process::Gaussian(p), Method::Seq(params)) => {
            seq::preprocess_gaussian(p, params, init, domain, data, names).map(Artifact::Seq)
        }
        (Process::Gaussian(p), Method::Fft) => {
            fft::preprocess(p, init, domain, data, names).map(Artifact::Fft)
        }
        (Process::Indicator(p), Method::Seq(params)) => {
            seq::preprocess_indicator(p, params, init, domain, data, names).map(Artifact::Seq)
        }
        (Process::Indicator(_), method) => Err(SimulationError::UnsupportedMethod(format!(
            "indicator processes simulate sequentially, not with {}",
            method.name()
        ))),
        (Process::Lindgren(p), _) => lindgren::preprocess(p, domain),
        (Process::External(p), method) => p
            .backend
            .preprocess(seed, method, init, domain, data)
            .map(Artifact::External),
    }
}

/// Produces one realization from the shared artifact.
pub fn single(
    child_seed: u64,
    process: &Process,
    method: &Method,
    domain: &Domain,
    artifact: &Artifact,
) -> Result<AttrTable> {
    match (artifact, process) {
        (Artifact::Lu(art), _) => lu::single(art, domain, child_seed),
        (Artifact::Seq(art), _) => seq::single(art, domain, child_seed),
        (Artifact::Fft(art), _) => fft::single(art, domain, child_seed),
        (Artifact::External(art), Process::External(p)) => {
            p.backend.single(child_seed, method, domain, art)
        }
        (Artifact::External(_), _) => Err(SimulationError::UnsupportedMethod(
            "external artifact paired with an internal process".into(),
        )),
    }
}
