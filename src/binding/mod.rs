//! Binding of conditioning data onto a simulation domain.
//!
//! Binding produces, per output variable, a realization buffer of
//! `element_count(domain)` values and a parallel mask of known cells. Mask
//! cells are written here once and left untouched by the engines; missing
//! source values (`NaN`) are skipped.

use crate::core::{AttrTable, InitMethod, Result, SimulationError};
use crate::geometry::Domain;
use crate::search::NeighborhoodIndex;

/// One output variable's buffer and known-cell mask.
#[derive(Debug, Clone)]
pub struct BoundColumn {
    pub name: String,
    pub values: Vec<f64>,
    pub mask: Vec<bool>,
}

impl BoundColumn {
    pub fn empty(name: String, n: usize) -> Self {
        Self {
            name,
            values: vec![0.0; n],
            mask: vec![false; n],
        }
    }

    /// Indices of known cells.
    pub fn known_indices(&self) -> Vec<usize> {
        self.mask
            .iter()
            .enumerate()
            .filter_map(|(i, &m)| m.then_some(i))
            .collect()
    }
}

/// Binds `data` onto `domain` for the variables named in `names`.
///
/// Variables absent from the data come back with an all-false mask. When
/// `data` is `None` every column is empty (declared schema only).
pub fn bind(
    domain: &Domain,
    names: &[String],
    data: Option<&AttrTable>,
    init: &InitMethod,
) -> Result<Vec<BoundColumn>> {
    let n = domain.element_count();
    let Some(data) = data else {
        return Ok(names
            .iter()
            .map(|name| BoundColumn::empty(name.clone(), n))
            .collect());
    };

    let dest_of = destination_map(domain, data, init)?;

    let mut columns = Vec::with_capacity(names.len());
    for name in names {
        let mut column = BoundColumn::empty(name.clone(), n);
        if let Some(source) = data.column(name) {
            for &(row, cell) in &dest_of {
                let value = source[row];
                if value.is_nan() {
                    continue;
                }
                column.values[cell] = value;
                column.mask[cell] = true;
            }
        }
        columns.push(column);
    }
    Ok(columns)
}

/// Resolves `(data_row, domain_cell)` pairs for the chosen init method.
fn destination_map(
    domain: &Domain,
    data: &AttrTable,
    init: &InitMethod,
) -> Result<Vec<(usize, usize)>> {
    match init {
        InitMethod::Nearest => {
            let index = NeighborhoodIndex::new(domain);
            let mask = vec![true; domain.element_count()];
            Ok((0..data.len())
                .map(|row| {
                    let location = data.domain().centroid(row);
                    let nearest = index.search(&location, 1, &mask, None);
                    (row, nearest[0])
                })
                .collect())
        }
        InitMethod::Explicit { source, dest } => {
            let rows: Vec<usize> = match source {
                Some(rows) => rows.clone(),
                None => (0..data.len()).collect(),
            };
            if rows.len() != dest.len() {
                return Err(SimulationError::LengthMismatch(format!(
                    "explicit init has {} source rows and {} destination cells",
                    rows.len(),
                    dest.len()
                )));
            }
            let n = domain.element_count();
            for &cell in dest {
                if cell >= n {
                    return Err(SimulationError::LengthMismatch(format!(
                        "explicit destination {cell} out of range for {n} elements"
                    )));
                }
            }
            Ok(rows.into_iter().zip(dest.iter().copied()).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{CartesianGrid, PointSet};

    fn data_at(locations: Vec<Vec<f64>>, values: Vec<f64>) -> AttrTable {
        AttrTable::from_points(PointSet::from(locations), vec![("Z".into(), values)]).unwrap()
    }

    #[test]
    fn nearest_init_writes_closest_cell() {
        let domain = Domain::Grid(CartesianGrid::new(vec![10]));
        let data = data_at(vec![vec![0.0], vec![9.7]], vec![1.0, 2.0]);

        let columns = bind(&domain, &["Z".into()], Some(&data), &InitMethod::Nearest).unwrap();
        let column = &columns[0];
        assert!(column.mask[0] && column.mask[9]);
        assert_eq!(column.values[0], 1.0);
        assert_eq!(column.values[9], 2.0);
        assert_eq!(column.known_indices(), vec![0, 9]);
    }

    #[test]
    fn missing_values_leave_mask_unset() {
        let domain = Domain::Grid(CartesianGrid::new(vec![4]));
        let data = data_at(vec![vec![0.0], vec![3.0]], vec![f64::NAN, 5.0]);

        let columns = bind(&domain, &["Z".into()], Some(&data), &InitMethod::Nearest).unwrap();
        assert_eq!(columns[0].known_indices(), vec![3]);
    }

    #[test]
    fn explicit_init_checks_lengths() {
        let domain = Domain::Grid(CartesianGrid::new(vec![4]));
        let data = data_at(vec![vec![0.0], vec![1.0]], vec![1.0, 2.0]);
        let init = InitMethod::Explicit {
            source: Some(vec![0]),
            dest: vec![0, 1],
        };
        assert!(matches!(
            bind(&domain, &["Z".into()], Some(&data), &init),
            Err(SimulationError::LengthMismatch(_))
        ));
    }

    #[test]
    fn explicit_init_defaults_source_to_all_rows() {
        let domain = Domain::Grid(CartesianGrid::new(vec![4]));
        let data = data_at(vec![vec![0.0], vec![1.0]], vec![1.0, 2.0]);
        let init = InitMethod::Explicit {
            source: None,
            dest: vec![3, 1],
        };
        let columns = bind(&domain, &["Z".into()], Some(&data), &init).unwrap();
        assert_eq!(columns[0].values[3], 1.0);
        assert_eq!(columns[0].values[1], 2.0);
        assert_eq!(columns[0].known_indices(), vec![1, 3]);
    }
}
