//! Spectral (FFT moving-average) simulation on regular grids.
//!
//! Preprocessing evaluates the covariance around a reference cell, shifts the
//! lag origin to the array origin, and keeps the square-root amplitude
//! spectrum with a zeroed DC bin. A realization filters white noise through
//! that spectrum, rescales to the function sill, and, when conditioning data
//! is present, substitutes kriging residuals (classical FFT-MA).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use num_complex::Complex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rustfft::{Fft, FftPlanner};
use tracing::warn;

use crate::binding::bind;
use crate::core::{AttrTable, GaussianProcess, InitMethod, Result, SimulationError};
use crate::functions::kriging::{FitStatus, Kriging};
use crate::geometry::{Domain, Point};
use crate::math::rng::standard_normals;
use crate::math::scaling::unit_scale;

static PLAN_CACHE: OnceLock<Mutex<HashMap<(usize, bool), Arc<dyn Fft<f64>>>>> = OnceLock::new();

fn plan(len: usize, inverse: bool) -> Arc<dyn Fft<f64>> {
    let cache = PLAN_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = cache.lock().expect("FFT plan cache lock poisoned");
    if let Some(plan) = guard.get(&(len, inverse)) {
        return Arc::clone(plan);
    }
    let mut planner = FftPlanner::<f64>::new();
    let plan = if inverse {
        planner.plan_fft_inverse(len)
    } else {
        planner.plan_fft_forward(len)
    };
    guard.insert((len, inverse), Arc::clone(&plan));
    plan
}

/// In-place n-dimensional FFT over an x-fastest array, one axis at a time.
///
/// The inverse transform carries the full `1/N` normalization.
pub fn fftnd(data: &mut [Complex<f64>], shape: &[usize], inverse: bool) {
    let n = data.len();
    debug_assert_eq!(n, shape.iter().product::<usize>());

    let mut stride = 1;
    for &len in shape {
        if len > 1 {
            let fft = plan(len, inverse);
            let mut line = vec![Complex::new(0.0, 0.0); len];
            for base in axis_line_starts(shape, stride, len) {
                for (t, slot) in line.iter_mut().enumerate() {
                    *slot = data[base + t * stride];
                }
                fft.process(&mut line);
                if inverse {
                    let inv = 1.0 / len as f64;
                    for v in &mut line {
                        *v *= inv;
                    }
                }
                for (t, &v) in line.iter().enumerate() {
                    data[base + t * stride] = v;
                }
            }
        }
        stride *= len;
    }
}

/// Linear offsets of every line start along the axis with the given stride.
fn axis_line_starts(shape: &[usize], stride: usize, len: usize) -> Vec<usize> {
    let total: usize = shape.iter().product();
    let mut starts = Vec::with_capacity(total / len);
    for i in 0..total {
        if (i / stride) % len == 0 {
            starts.push(i);
        }
    }
    starts
}

/// Circularly shifts a centered lag array so the center lands at the origin.
pub fn fftshift(data: &[f64], shape: &[usize]) -> Vec<f64> {
    let n = data.len();
    let mut out = vec![0.0; n];
    for (i, slot) in out.iter_mut().enumerate() {
        let mut src = 0;
        let mut rem = i;
        let mut stride = 1;
        for &len in shape {
            let c = rem % len;
            rem /= len;
            src += ((c + len / 2) % len) * stride;
            stride *= len;
        }
        *slot = data[src];
    }
    out
}

/// Per-realization conditioning state.
struct FftConditioning {
    /// Kriging mean field of the data over the full parent grid.
    z_bar: Vec<f64>,
    /// Grid cells closest to the data locations.
    data_cells: Vec<usize>,
    /// Scaled centroids of those cells.
    data_coords: Vec<Point>,
    kriging: Kriging,
}

/// Shared immutable preprocessing output of the FFT engine.
pub struct FftArtifact {
    name: String,
    shape: Vec<usize>,
    /// Square-root amplitude spectrum with a zeroed DC bin.
    spectrum: Vec<f64>,
    mean: f64,
    sill: f64,
    /// Scaled full parent grid, for conditioning predictions.
    sgrid: Domain,
    /// Active subset when the caller's domain is a grid view.
    view: Option<Vec<usize>>,
    cond: Option<FftConditioning>,
}

pub fn preprocess(
    process: &GaussianProcess,
    init: &InitMethod,
    domain: &Domain,
    data: Option<&AttrTable>,
    names: Vec<String>,
) -> Result<FftArtifact> {
    let func = &process.func;
    if !func.is_stationary() {
        return Err(SimulationError::NotStationary(
            "FFT simulation requires a stationary function".into(),
        ));
    }
    if func.variate_count() != 1 {
        return Err(SimulationError::UnsupportedMethod(
            "FFT simulation is univariate".into(),
        ));
    }
    if names.len() != 1 {
        return Err(SimulationError::ShapeMismatch(format!(
            "FFT simulation outputs one variable, got {}",
            names.len()
        )));
    }
    let grid = domain
        .parent_grid()
        .ok_or_else(|| {
            SimulationError::UnsupportedMethod("FFT simulation requires a grid domain".into())
        })?
        .clone();

    let min_side = grid.bounding_box().min_side();
    if func.range() > min_side / 3.0 {
        warn!(
            range = func.range(),
            min_side, "correlation length above min_side/3 produces tiling artifacts"
        );
    }

    let grid_domain = Domain::Grid(grid.clone());
    let frame = unit_scale(&grid_domain, func, None);
    let shape = grid.dims().to_vec();
    let total = grid.element_count();

    // Covariance around the reference cell at shape/2.
    let reference: Vec<usize> = shape.iter().map(|&d| d / 2).collect();
    let ref_centroid = frame
        .domain
        .centroid(grid.linear_index(&reference));
    let lags: Vec<f64> = (0..total)
        .map(|i| {
            frame
                .func
                .cov(0, 0, ref_centroid.distance(&frame.domain.centroid(i)))
        })
        .collect();

    let mut buf: Vec<Complex<f64>> = fftshift(&lags, &shape)
        .into_iter()
        .map(|v| Complex::new(v, 0.0))
        .collect();
    fftnd(&mut buf, &shape, false);
    let mut spectrum: Vec<f64> = buf.iter().map(|v| v.norm().sqrt()).collect();
    // Zero the DC bin to subtract the constant mean.
    spectrum[0] = 0.0;

    let cond = match data {
        Some(data) => {
            let column = bind(&grid_domain, &names, Some(data), init)?.remove(0);
            let data_cells = column.known_indices();
            if data_cells.is_empty() {
                None
            } else {
                let data_coords: Vec<Point> = data_cells
                    .iter()
                    .map(|&i| frame.domain.centroid(i))
                    .collect();
                let values: Vec<f64> = data_cells.iter().map(|&i| column.values[i]).collect();
                let kriging = Kriging::new(frame.func.clone(), vec![process.mean[0]]);
                let z_bar = kriging
                    .fit_predict(&data_coords, &[values], &frame.domain)?
                    .remove(0);
                Some(FftConditioning {
                    z_bar,
                    data_cells,
                    data_coords,
                    kriging,
                })
            }
        }
        None => None,
    };

    Ok(FftArtifact {
        name: names.into_iter().next().expect("one name"),
        shape,
        spectrum,
        mean: process.mean[0],
        sill: func.marginal_sill(0),
        sgrid: frame.domain,
        view: domain.parent_indices().map(<[usize]>::to_vec),
        cond,
    })
}

pub fn single(artifact: &FftArtifact, domain: &Domain, seed: u64) -> Result<AttrTable> {
    let mut rng = StdRng::seed_from_u64(seed);
    let total: usize = artifact.shape.iter().product();

    let mut buf: Vec<Complex<f64>> = standard_normals(&mut rng, total)
        .into_iter()
        .map(|z| Complex::new(z, 0.0))
        .collect();
    fftnd(&mut buf, &artifact.shape, false);
    for (v, &amp) in buf.iter_mut().zip(artifact.spectrum.iter()) {
        *v = Complex::from_polar(amp, v.arg());
    }
    fftnd(&mut buf, &artifact.shape, true);

    // Rescale the synthesized field to the function sill, then shift to the
    // process mean.
    let mut z: Vec<f64> = buf.iter().map(|v| v.re).collect();
    let m = z.iter().sum::<f64>() / total as f64;
    let var = z.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / total as f64;
    let gain = if var > 0.0 {
        (artifact.sill / var).sqrt()
    } else {
        0.0
    };
    for v in &mut z {
        *v = (*v - m) * gain + artifact.mean;
    }

    if let Some(cond) = &artifact.cond {
        // FFT-MA residual substitution: condition by swapping the
        // unconditional kriging field for the data's.
        let z_u: Vec<f64> = cond.data_cells.iter().map(|&i| z[i]).collect();
        let fit = cond.kriging.fit(&cond.data_coords, &[z_u]);
        if fit.status() == FitStatus::Singular {
            return Err(SimulationError::NotPositiveDefinite(
                "conditioning kriging system is singular".into(),
            ));
        }
        for (i, value) in z.iter_mut().enumerate() {
            let z_bar_u = cond
                .kriging
                .predict(&fit, &artifact.sgrid.centroid(i))
                .expect("fit succeeded")[0]
                .0;
            *value = cond.z_bar[i] + *value - z_bar_u;
        }
    }

    let values = match &artifact.view {
        Some(view) => view.iter().map(|&i| z[i]).collect(),
        None => z,
    };
    AttrTable::from_columns(domain.clone(), vec![(artifact.name.clone(), values)])
}
