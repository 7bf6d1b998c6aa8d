//! Ensembles: indexable collections of realizations with reductions.

use std::sync::mpsc::Receiver;
use std::sync::Mutex;

use crate::core::{AttrTable, Result, SimulationError};
use crate::geometry::Domain;

type Slot = std::result::Result<AttrTable, SimulationError>;

struct Inner {
    slots: Vec<Option<Slot>>,
    /// Present for async ensembles; drained lazily as slots are requested.
    rx: Option<Receiver<(usize, Slot)>>,
}

/// A collection of realizations over one domain.
///
/// Synchronous ensembles hold every slot up front; asynchronous ones resolve
/// slots on demand from the worker channel, so consumers can stream
/// realizations as they are produced. Failed realizations occupy their slot
/// with the recorded [`SimulationError`] without affecting peers.
pub struct Ensemble {
    domain: Domain,
    variables: Vec<String>,
    inner: Mutex<Inner>,
}

impl Ensemble {
    /// Wraps already-computed realizations (all slots succeed).
    pub fn from_tables(domain: Domain, tables: Vec<AttrTable>) -> Self {
        let variables = tables
            .first()
            .map(|t| t.names().map(str::to_string).collect())
            .unwrap_or_default();
        Self {
            domain,
            variables,
            inner: Mutex::new(Inner {
                slots: tables.into_iter().map(|t| Some(Ok(t))).collect(),
                rx: None,
            }),
        }
    }

    /// Wraps per-realization results, failures included.
    pub fn from_slots(domain: Domain, variables: Vec<String>, slots: Vec<Slot>) -> Self {
        Self {
            domain,
            variables,
            inner: Mutex::new(Inner {
                slots: slots.into_iter().map(Some).collect(),
                rx: None,
            }),
        }
    }

    /// An ensemble whose `count` slots arrive through `rx`.
    pub fn pending(
        domain: Domain,
        variables: Vec<String>,
        count: usize,
        rx: Receiver<(usize, Slot)>,
    ) -> Self {
        Self {
            domain,
            variables,
            inner: Mutex::new(Inner {
                slots: (0..count).map(|_| None).collect(),
                rx: Some(rx),
            }),
        }
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("ensemble lock poisoned").slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Realization `i`, blocking on the worker channel if still pending.
    pub fn get(&self, i: usize) -> Result<AttrTable> {
        let mut guard = self.inner.lock().expect("ensemble lock poisoned");
        let inner = &mut *guard;
        while inner.slots[i].is_none() {
            let received = inner
                .rx
                .as_ref()
                .expect("pending slot without channel")
                .recv();
            match received {
                Ok((slot, result)) => inner.slots[slot] = Some(result),
                Err(_) => {
                    return Err(SimulationError::WorkerFailure {
                        index: i,
                        message: "worker channel closed before the slot resolved".into(),
                    })
                }
            }
        }
        inner.slots[i].as_ref().expect("slot resolved").clone()
    }

    /// Resolves every slot, failing on the first recorded error.
    pub fn tables(&self) -> Result<Vec<AttrTable>> {
        (0..self.len()).map(|i| self.get(i)).collect()
    }

    /// Per-cell arithmetic mean of every variable.
    pub fn mean(&self) -> Result<AttrTable> {
        self.reduce(|values| values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Per-cell sample variance of every variable.
    pub fn variance(&self) -> Result<AttrTable> {
        self.reduce(|values| {
            let n = values.len() as f64;
            if n < 2.0 {
                return 0.0;
            }
            let mean = values.iter().sum::<f64>() / n;
            values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0)
        })
    }

    /// Per-cell fraction of realizations at or below `x`.
    pub fn cdf(&self, x: f64) -> Result<AttrTable> {
        self.reduce(move |values| {
            values.iter().filter(|&&v| v <= x).count() as f64 / values.len() as f64
        })
    }

    /// Per-cell quantile via the linear-interpolation order-statistic rule.
    pub fn quantile(&self, p: f64) -> Result<AttrTable> {
        self.reduce(move |values| {
            let mut sorted = values.to_vec();
            sorted.sort_by(|a, b| a.partial_cmp(b).expect("finite realizations"));
            let h = (sorted.len() - 1) as f64 * p.clamp(0.0, 1.0);
            let lo = h.floor() as usize;
            let hi = (lo + 1).min(sorted.len() - 1);
            sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
        })
    }

    fn reduce(&self, stat: impl Fn(&[f64]) -> f64) -> Result<AttrTable> {
        let tables = self.tables()?;
        if tables.is_empty() {
            return Err(SimulationError::ShapeMismatch(
                "cannot reduce an empty ensemble".into(),
            ));
        }
        let n = self.domain.element_count();
        let mut columns = Vec::with_capacity(self.variables.len());
        let mut per_real = vec![0.0; tables.len()];
        for name in &self.variables {
            let mut reduced = vec![0.0; n];
            for (cell, slot) in reduced.iter_mut().enumerate() {
                for (r, table) in tables.iter().enumerate() {
                    let column = table.column(name).ok_or_else(|| {
                        SimulationError::ShapeMismatch(format!(
                            "realization {r} is missing variable `{name}`"
                        ))
                    })?;
                    per_real[r] = column[cell];
                }
                *slot = stat(&per_real);
            }
            columns.push((name.clone(), reduced));
        }
        AttrTable::from_columns(self.domain.clone(), columns)
    }
}
