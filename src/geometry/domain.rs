//! The simulation domain: grids, grid views, and point sets.

use serde::{Deserialize, Serialize};

use crate::geometry::grid::{CartesianGrid, GridView};
use crate::geometry::point::{BoundingBox, Point};

/// An unstructured collection of point locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSet {
    points: Vec<Point>,
}

impl PointSet {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn scale(&self, alpha: f64) -> Self {
        Self {
            points: self.points.iter().map(|p| p.scale(alpha)).collect(),
        }
    }
}

impl From<Vec<Vec<f64>>> for PointSet {
    fn from(coords: Vec<Vec<f64>>) -> Self {
        Self::new(coords.into_iter().map(Point::new).collect())
    }
}

/// An ordered sequence of elements embedded in n-dimensional space.
///
/// Invariant: `element_count() > 0` for any domain handed to a simulation
/// entry point; views are non-empty by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Domain {
    Grid(CartesianGrid),
    View(GridView),
    Points(PointSet),
}

impl Domain {
    pub fn element_count(&self) -> usize {
        match self {
            Self::Grid(g) => g.element_count(),
            Self::View(v) => v.element_count(),
            Self::Points(p) => p.len(),
        }
    }

    pub fn ndims(&self) -> usize {
        match self {
            Self::Grid(g) => g.ndims(),
            Self::View(v) => v.parent().ndims(),
            Self::Points(p) => p.points().first().map_or(0, Point::ndims),
        }
    }

    pub fn centroid(&self, i: usize) -> Point {
        match self {
            Self::Grid(g) => g.centroid(i),
            Self::View(v) => v.centroid(i),
            Self::Points(p) => p.points()[i].clone(),
        }
    }

    /// All element centroids in index order.
    pub fn centroids(&self) -> Vec<Point> {
        (0..self.element_count()).map(|i| self.centroid(i)).collect()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            Self::Grid(g) => g.bounding_box(),
            Self::View(v) => v.parent().bounding_box(),
            Self::Points(p) => {
                BoundingBox::around(p.points().iter()).expect("point sets are non-empty")
            }
        }
    }

    /// The underlying lattice when this domain is a grid or a view of one.
    pub fn parent_grid(&self) -> Option<&CartesianGrid> {
        match self {
            Self::Grid(g) => Some(g),
            Self::View(v) => Some(v.parent()),
            Self::Points(_) => None,
        }
    }

    /// Active indices into the parent grid; `None` means all cells.
    pub fn parent_indices(&self) -> Option<&[usize]> {
        match self {
            Self::View(v) => Some(v.parent_indices()),
            _ => None,
        }
    }

    pub fn scale(&self, alpha: f64) -> Domain {
        match self {
            Self::Grid(g) => Self::Grid(g.scale(alpha)),
            Self::View(v) => Self::View(v.scale(alpha)),
            Self::Points(p) => Self::Points(p.scale(alpha)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_domain_reports_parent_grid() {
        let grid = CartesianGrid::new(vec![10, 10]);
        let domain = Domain::View(GridView::new(grid.clone(), (0..5).collect()));
        assert_eq!(domain.element_count(), 5);
        assert_eq!(domain.parent_grid(), Some(&grid));
        assert_eq!(domain.parent_indices().map(<[usize]>::len), Some(5));
    }

    #[test]
    fn point_set_bounding_box() {
        let domain = Domain::Points(PointSet::from(vec![vec![0.0, 0.0], vec![2.0, 3.0]]));
        let bbox = domain.bounding_box();
        assert_eq!(bbox.max_side(), 3.0);
    }
}
