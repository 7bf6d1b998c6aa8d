//! Geometry primitives consumed by the simulation engines.

mod domain;
mod grid;
mod point;

pub use domain::{Domain, PointSet};
pub use grid::{CartesianGrid, GridView};
pub use point::{BoundingBox, MetricBall, Point};
