//! Points, bounding boxes, and metric balls in n-dimensional space.

use serde::{Deserialize, Serialize};

/// A location in n-dimensional Euclidean space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    coords: Vec<f64>,
}

impl Point {
    pub fn new(coords: Vec<f64>) -> Self {
        Self { coords }
    }

    pub fn ndims(&self) -> usize {
        self.coords.len()
    }

    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        self.coords
            .iter()
            .zip(other.coords.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }

    /// Scales every coordinate by `alpha`.
    pub fn scale(&self, alpha: f64) -> Point {
        Point::new(self.coords.iter().map(|c| c * alpha).collect())
    }
}

impl From<Vec<f64>> for Point {
    fn from(coords: Vec<f64>) -> Self {
        Point::new(coords)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

impl BoundingBox {
    pub fn new(min: Vec<f64>, max: Vec<f64>) -> Self {
        Self { min, max }
    }

    /// Smallest box containing all of `points`. Returns `None` when empty.
    pub fn around<'a>(mut points: impl Iterator<Item = &'a Point>) -> Option<Self> {
        let first = points.next()?;
        let mut min = first.coords().to_vec();
        let mut max = min.clone();
        for p in points {
            for (k, &c) in p.coords().iter().enumerate() {
                if c < min[k] {
                    min[k] = c;
                }
                if c > max[k] {
                    max[k] = c;
                }
            }
        }
        Some(Self { min, max })
    }

    pub fn ndims(&self) -> usize {
        self.min.len()
    }

    pub fn sides(&self) -> Vec<f64> {
        self.min
            .iter()
            .zip(self.max.iter())
            .map(|(lo, hi)| hi - lo)
            .collect()
    }

    pub fn min_side(&self) -> f64 {
        self.sides().into_iter().fold(f64::INFINITY, f64::min)
    }

    pub fn max_side(&self) -> f64 {
        self.sides().into_iter().fold(0.0, f64::max)
    }

    pub fn volume(&self) -> f64 {
        self.sides().into_iter().product()
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.coords()
            .iter()
            .zip(self.min.iter().zip(self.max.iter()))
            .all(|(&c, (&lo, &hi))| c >= lo && c <= hi)
    }
}

/// Isotropic or anisotropic metric ball.
///
/// The normalized metric `sqrt(sum_k ((a_k - b_k) / r_k)^2)` defines both
/// membership (`<= 1`) and neighbor ordering when a ball restricts a search.
/// An isotropic ball stores a single radius broadcast over all axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricBall {
    radii: Vec<f64>,
}

impl MetricBall {
    pub fn isotropic(radius: f64) -> Self {
        Self {
            radii: vec![radius],
        }
    }

    pub fn anisotropic(radii: Vec<f64>) -> Self {
        Self { radii }
    }

    pub fn radius(&self, axis: usize) -> f64 {
        if self.radii.len() == 1 {
            self.radii[0]
        } else {
            self.radii[axis.min(self.radii.len() - 1)]
        }
    }

    pub fn max_radius(&self) -> f64 {
        self.radii.iter().copied().fold(0.0, f64::max)
    }

    /// Distance in ball-normalized units; `<= 1` means inside the ball.
    pub fn normalized_distance(&self, a: &Point, b: &Point) -> f64 {
        a.coords()
            .iter()
            .zip(b.coords().iter())
            .enumerate()
            .map(|(k, (x, y))| {
                let r = self.radius(k);
                let d = (x - y) / r;
                d * d
            })
            .sum::<f64>()
            .sqrt()
    }

    pub fn contains(&self, center: &Point, p: &Point) -> bool {
        self.normalized_distance(center, p) <= 1.0
    }

    pub fn scale(&self, alpha: f64) -> Self {
        Self {
            radii: self.radii.iter().map(|r| r * alpha).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bounding_box_around_points() {
        let pts = vec![
            Point::new(vec![1.0, -2.0]),
            Point::new(vec![-3.0, 4.0]),
            Point::new(vec![0.5, 0.5]),
        ];
        let bbox = BoundingBox::around(pts.iter()).unwrap();
        assert_eq!(bbox.min, vec![-3.0, -2.0]);
        assert_eq!(bbox.max, vec![1.0, 4.0]);
        assert_relative_eq!(bbox.max_side(), 6.0);
        assert_relative_eq!(bbox.min_side(), 4.0);
    }

    #[test]
    fn anisotropic_ball_membership() {
        let ball = MetricBall::anisotropic(vec![2.0, 1.0]);
        let center = Point::new(vec![0.0, 0.0]);
        assert!(ball.contains(&center, &Point::new(vec![1.9, 0.0])));
        assert!(!ball.contains(&center, &Point::new(vec![0.0, 1.1])));
    }

    #[test]
    fn isotropic_ball_broadcasts_radius() {
        let ball = MetricBall::isotropic(3.0);
        assert_relative_eq!(ball.radius(0), 3.0);
        assert_relative_eq!(ball.radius(5), 3.0);
    }
}
