//! Attribute tables: named dense columns bound to a domain.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimulationError};
use crate::geometry::{Domain, PointSet};

/// A realization or conditioning-data table.
///
/// Every column has exactly `element_count(domain)` values. Conditioning data
/// carries a [`PointSet`] domain of sample locations; realizations carry the
/// simulation domain. Missing values are encoded as `NaN` and skipped by
/// data binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttrTable {
    domain: Domain,
    columns: IndexMap<String, Vec<f64>>,
}

impl AttrTable {
    /// Creates an empty table over `domain` (columns added afterwards).
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            columns: IndexMap::new(),
        }
    }

    /// Builds a table from `(name, values)` pairs, validating column lengths.
    pub fn from_columns(domain: Domain, columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        let n = domain.element_count();
        for (name, values) in &columns {
            if values.len() != n {
                return Err(SimulationError::ShapeMismatch(format!(
                    "column `{name}` has {} values for a domain of {} elements",
                    values.len(),
                    n
                )));
            }
        }
        Ok(Self {
            domain,
            columns: columns.into_iter().collect(),
        })
    }

    /// Convenience constructor for point-located conditioning data.
    pub fn from_points(points: PointSet, columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        Self::from_columns(Domain::Points(points), columns)
    }

    /// Adds or replaces a column.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if values.len() != self.domain.element_count() {
            return Err(SimulationError::ShapeMismatch(format!(
                "column `{name}` has {} values for a domain of {} elements",
                values.len(),
                self.domain.element_count()
            )));
        }
        self.columns.insert(name, values);
        Ok(())
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Number of rows (domain elements).
    pub fn len(&self) -> usize {
        self.domain.element_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Column by insertion position.
    pub fn column_at(&self, index: usize) -> Option<(&str, &[f64])> {
        self.columns
            .get_index(index)
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::CartesianGrid;

    #[test]
    fn rejects_mismatched_column_length() {
        let grid = Domain::Grid(CartesianGrid::new(vec![4]));
        let result = AttrTable::from_columns(grid, vec![("Z".into(), vec![1.0, 2.0])]);
        assert!(matches!(result, Err(SimulationError::ShapeMismatch(_))));
    }

    #[test]
    fn preserves_column_order() {
        let grid = Domain::Grid(CartesianGrid::new(vec![2]));
        let table = AttrTable::from_columns(
            grid,
            vec![
                ("Z2".into(), vec![0.0, 0.0]),
                ("Z1".into(), vec![1.0, 1.0]),
            ],
        )
        .unwrap();
        let names = table.names().collect::<Vec<_>>();
        assert_eq!(names, vec!["Z2", "Z1"]);
    }
}
