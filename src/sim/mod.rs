//! Simulation orchestration: the uniform entry points.
//!
//! `draw` and `draw_many` validate the request, auto-select a method when
//! none is given, run the engine preprocess exactly once, and fan independent
//! `single` calls over the worker pool. Realization `i` always consumes the
//! child stream derived from `(seed, i)`, so ensemble content is bit-identical
//! for any worker count or schedule.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info};

use crate::core::{
    AttrTable, DrawOptions, Method, Process, Result, SimulationError, WorkerId,
};
use crate::engines::{self, Artifact};
use crate::ensemble::Ensemble;
use crate::geometry::Domain;
use crate::math::rng::child_seed;

/// Produces a single realization inline.
pub fn draw(
    seed: u64,
    process: &Process,
    domain: &Domain,
    options: &DrawOptions,
) -> Result<AttrTable> {
    let (method, artifact, _) = prepare(seed, process, domain, options)?;
    engines::single(child_seed(seed, 0), process, &method, domain, &artifact)
}

/// Produces `count` realizations, scheduled over the worker pool.
pub fn draw_many(
    seed: u64,
    process: &Process,
    domain: &Domain,
    count: usize,
    options: &DrawOptions,
) -> Result<Ensemble> {
    let (method, artifact, names) = prepare(seed, process, domain, options)?;

    if options.async_mode {
        return Ok(spawn_async(
            seed, process, domain, count, options, method, artifact, names,
        ));
    }

    let run = |i: usize| -> std::result::Result<AttrTable, SimulationError> {
        let result = engines::single(child_seed(seed, i), process, &method, domain, &artifact);
        if options.show_progress {
            info!(realization = i, ok = result.is_ok(), "realization finished");
        }
        result.map_err(|source| SimulationError::WorkerFailure {
            index: i,
            message: source.to_string(),
        })
    };

    #[cfg(feature = "parallel")]
    let slots: Vec<_> = if options.workers.len() > 1 {
        (0..count).into_par_iter().map(run).collect()
    } else {
        (0..count).map(run).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let slots: Vec<_> = (0..count).map(run).collect();

    if options.fail_fast {
        if let Some(error) = slots.iter().find_map(|slot| slot.as_ref().err()) {
            return Err(error.clone());
        }
    }
    Ok(Ensemble::from_slots(domain.clone(), names, slots))
}

/// Validates the request, selects the method, and runs preprocess once.
fn prepare(
    seed: u64,
    process: &Process,
    domain: &Domain,
    options: &DrawOptions,
) -> Result<(Method, Arc<Artifact>, Vec<String>)> {
    if domain.element_count() == 0 {
        return Err(SimulationError::ShapeMismatch(
            "simulation domains must be non-empty".into(),
        ));
    }
    if options.async_mode {
        if options.workers.contains(&WorkerId::CALLER) {
            return Err(SimulationError::InvalidWorkerPool(
                "async mode with the calling worker in the pool would deadlock the caller".into(),
            ));
        }
        if options.workers.is_empty() {
            return Err(SimulationError::InvalidWorkerPool(
                "async mode needs at least one worker".into(),
            ));
        }
    }
    process.validate()?;

    let method = options
        .method
        .clone()
        .unwrap_or_else(|| engines::default_method(process, domain, options.data.as_ref()));
    debug!(method = method.name(), "selected simulation method");

    let artifact = engines::preprocess(
        seed,
        process,
        &method,
        &options.init,
        domain,
        options.data.as_ref(),
    )?;
    let names = engines::output_names(process, options.data.as_ref());
    Ok((method, Arc::new(artifact), names))
}

/// Spawns one dedicated thread per pool worker; slots stream back over a
/// channel and resolve lazily through the ensemble's fetch.
#[allow(clippy::too_many_arguments)]
fn spawn_async(
    seed: u64,
    process: &Process,
    domain: &Domain,
    count: usize,
    options: &DrawOptions,
    method: Method,
    artifact: Arc<Artifact>,
    names: Vec<String>,
) -> Ensemble {
    let (tx, rx) = mpsc::channel();
    let next = Arc::new(AtomicUsize::new(0));

    for worker in options.workers.iter().copied() {
        let tx = tx.clone();
        let next = Arc::clone(&next);
        let artifact = Arc::clone(&artifact);
        let process = process.clone();
        let domain = domain.clone();
        let method = method.clone();
        let show_progress = options.show_progress;

        thread::spawn(move || loop {
            let i = next.fetch_add(1, Ordering::SeqCst);
            if i >= count {
                break;
            }
            let result = engines::single(child_seed(seed, i), &process, &method, &domain, &artifact)
                .map_err(|source| SimulationError::WorkerFailure {
                    index: i,
                    message: source.to_string(),
                });
            if show_progress {
                info!(worker = worker.0, realization = i, "realization finished");
            }
            if tx.send((i, result)).is_err() {
                break;
            }
        });
    }

    Ensemble::pending(domain.clone(), names, count, rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GaussianProcess;
    use crate::functions::{GeoFunction, Kernel};
    use crate::geometry::CartesianGrid;

    fn small_process() -> Process {
        let func = GeoFunction::covariance(Kernel::Spherical, 5.0);
        Process::Gaussian(GaussianProcess::univariate(func, 0.0))
    }

    #[test]
    fn async_with_caller_in_pool_is_rejected_before_scheduling() {
        let domain = Domain::Grid(CartesianGrid::new(vec![10]));
        let options = DrawOptions::default()
            .with_async(true)
            .with_workers(vec![WorkerId::CALLER, WorkerId(1)]);
        assert!(matches!(
            draw_many(1, &small_process(), &domain, 2, &options),
            Err(SimulationError::InvalidWorkerPool(_))
        ));
    }

    #[test]
    fn async_pool_produces_every_slot() {
        let domain = Domain::Grid(CartesianGrid::new(vec![12]));
        let options = DrawOptions::default()
            .with_async(true)
            .with_workers(vec![WorkerId(1), WorkerId(2)]);
        let ensemble = draw_many(5, &small_process(), &domain, 4, &options).unwrap();
        for i in 0..4 {
            assert_eq!(ensemble.get(i).unwrap().column("Z").unwrap().len(), 12);
        }
    }

    #[test]
    fn async_matches_synchronous_results() {
        let domain = Domain::Grid(CartesianGrid::new(vec![12]));
        let sync = draw_many(5, &small_process(), &domain, 3, &DrawOptions::default()).unwrap();
        let options = DrawOptions::default()
            .with_async(true)
            .with_workers(vec![WorkerId(1)]);
        let lazy = draw_many(5, &small_process(), &domain, 3, &options).unwrap();
        for i in 0..3 {
            assert_eq!(
                sync.get(i).unwrap().column("Z"),
                lazy.get(i).unwrap().column("Z")
            );
        }
    }
}
