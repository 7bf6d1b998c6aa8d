//! Regular Cartesian lattices and index-subset views.

use serde::{Deserialize, Serialize};

use crate::geometry::point::{BoundingBox, Point};

/// Regular lattice with a shape tuple, minimum corner, and cell spacing.
///
/// Linear indexing is x-fastest: for dims `(nx, ny)`, cell `(i, j)` has
/// linear index `i + j * nx`. Cell centroids sit at
/// `origin + (index + 0.5) * spacing` per axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartesianGrid {
    dims: Vec<usize>,
    origin: Vec<f64>,
    spacing: Vec<f64>,
}

impl CartesianGrid {
    /// Grid with origin at zero and unit spacing.
    pub fn new(dims: Vec<usize>) -> Self {
        let nd = dims.len();
        Self {
            dims,
            origin: vec![0.0; nd],
            spacing: vec![1.0; nd],
        }
    }

    pub fn with_geometry(dims: Vec<usize>, origin: Vec<f64>, spacing: Vec<f64>) -> Self {
        assert_eq!(dims.len(), origin.len(), "origin dimension mismatch");
        assert_eq!(dims.len(), spacing.len(), "spacing dimension mismatch");
        Self {
            dims,
            origin,
            spacing,
        }
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn origin(&self) -> &[f64] {
        &self.origin
    }

    pub fn spacing(&self) -> &[f64] {
        &self.spacing
    }

    pub fn ndims(&self) -> usize {
        self.dims.len()
    }

    pub fn element_count(&self) -> usize {
        self.dims.iter().product()
    }

    /// Linear index of a multi-index (x-fastest).
    pub fn linear_index(&self, multi: &[usize]) -> usize {
        debug_assert_eq!(multi.len(), self.dims.len());
        let mut index = 0;
        let mut stride = 1;
        for (i, &n) in multi.iter().zip(self.dims.iter()) {
            debug_assert!(*i < n);
            index += i * stride;
            stride *= n;
        }
        index
    }

    /// Multi-index of a linear index (x-fastest).
    pub fn multi_index(&self, mut linear: usize) -> Vec<usize> {
        let mut multi = Vec::with_capacity(self.dims.len());
        for &n in &self.dims {
            multi.push(linear % n);
            linear /= n;
        }
        multi
    }

    pub fn centroid(&self, linear: usize) -> Point {
        let multi = self.multi_index(linear);
        Point::new(
            multi
                .iter()
                .enumerate()
                .map(|(k, &i)| self.origin[k] + (i as f64 + 0.5) * self.spacing[k])
                .collect(),
        )
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let max = self
            .dims
            .iter()
            .enumerate()
            .map(|(k, &n)| self.origin[k] + n as f64 * self.spacing[k])
            .collect();
        BoundingBox::new(self.origin.clone(), max)
    }

    pub fn scale(&self, alpha: f64) -> Self {
        Self {
            dims: self.dims.clone(),
            origin: self.origin.iter().map(|c| c * alpha).collect(),
            spacing: self.spacing.iter().map(|s| s * alpha).collect(),
        }
    }
}

/// A non-empty subset of grid cells, preserving the parent lattice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridView {
    grid: CartesianGrid,
    indices: Vec<usize>,
}

impl GridView {
    /// Panics on an empty index set or out-of-range indices; views are
    /// non-empty by construction.
    pub fn new(grid: CartesianGrid, indices: Vec<usize>) -> Self {
        assert!(!indices.is_empty(), "grid views must be non-empty");
        let n = grid.element_count();
        assert!(
            indices.iter().all(|&i| i < n),
            "view index out of range for parent grid"
        );
        Self { grid, indices }
    }

    /// The originating grid.
    pub fn parent(&self) -> &CartesianGrid {
        &self.grid
    }

    /// Active cell indices into the parent grid.
    pub fn parent_indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn element_count(&self) -> usize {
        self.indices.len()
    }

    pub fn centroid(&self, i: usize) -> Point {
        self.grid.centroid(self.indices[i])
    }

    pub fn scale(&self, alpha: f64) -> Self {
        Self {
            grid: self.grid.scale(alpha),
            indices: self.indices.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn linear_index_roundtrip_is_x_fastest() {
        let grid = CartesianGrid::new(vec![4, 3]);
        assert_eq!(grid.linear_index(&[1, 0]), 1);
        assert_eq!(grid.linear_index(&[0, 1]), 4);
        for i in 0..grid.element_count() {
            assert_eq!(grid.linear_index(&grid.multi_index(i)), i);
        }
    }

    #[test]
    fn centroids_respect_origin_and_spacing() {
        let grid = CartesianGrid::with_geometry(vec![2, 2], vec![0.5, 0.5], vec![1.0, 1.0]);
        let c = grid.centroid(0);
        assert_relative_eq!(c.coords()[0], 1.0);
        assert_relative_eq!(c.coords()[1], 1.0);
        let c = grid.centroid(3);
        assert_relative_eq!(c.coords()[0], 2.0);
        assert_relative_eq!(c.coords()[1], 2.0);
    }

    #[test]
    fn view_recovers_parent_and_subset() {
        let grid = CartesianGrid::new(vec![10, 10]);
        let view = GridView::new(grid.clone(), (0..50).collect());
        assert_eq!(view.parent(), &grid);
        assert_eq!(view.parent_indices().len(), 50);
        assert_eq!(view.centroid(0), grid.centroid(0));
    }
}
