//! Point-process simulation: random point patterns inside a region.
//!
//! Binomial patterns place a fixed number of uniform points; Poisson patterns
//! draw the count from `Poisson(intensity * volume)`; cluster patterns
//! (Thomas, Neyman-Scott) scatter offspring around a parent pattern through
//! an [`Offspring`] generator. Offspring falling outside the region are
//! discarded.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Poisson, StandardNormal};

use crate::geometry::{BoundingBox, Point, PointSet};

/// Generates the offspring of one parent point.
pub trait Offspring: Send + Sync {
    fn offspring(&self, parent: &Point, rng: &mut StdRng) -> Vec<Point>;
}

/// Thomas-process offspring: a Poisson-distributed count of isotropic
/// Gaussian displacements.
#[derive(Debug, Clone, Copy)]
pub struct GaussianOffspring {
    pub mean_count: f64,
    pub sigma: f64,
}

impl Offspring for GaussianOffspring {
    fn offspring(&self, parent: &Point, rng: &mut StdRng) -> Vec<Point> {
        let count = poisson_count(self.mean_count, rng);
        (0..count)
            .map(|_| {
                Point::new(
                    parent
                        .coords()
                        .iter()
                        .map(|&c| {
                            let z: f64 = StandardNormal.sample(rng);
                            c + self.sigma * z
                        })
                        .collect(),
                )
            })
            .collect()
    }
}

/// Neyman-Scott offspring: a Poisson-distributed count uniform in a ball.
#[derive(Debug, Clone, Copy)]
pub struct BallOffspring {
    pub mean_count: f64,
    pub radius: f64,
}

impl Offspring for BallOffspring {
    fn offspring(&self, parent: &Point, rng: &mut StdRng) -> Vec<Point> {
        let count = poisson_count(self.mean_count, rng);
        let ndims = parent.ndims();
        (0..count)
            .map(|_| {
                // Uniform in the ball: a normalized Gaussian direction with a
                // radius drawn as u^(1/d).
                let direction: Vec<f64> =
                    (0..ndims).map(|_| StandardNormal.sample(rng)).collect();
                let norm = direction.iter().map(|d| d * d).sum::<f64>().sqrt();
                let u: f64 = rng.random();
                let r = self.radius * u.powf(1.0 / ndims as f64);
                Point::new(
                    parent
                        .coords()
                        .iter()
                        .zip(direction.iter())
                        .map(|(&c, &d)| {
                            if norm > 0.0 {
                                c + r * d / norm
                            } else {
                                c
                            }
                        })
                        .collect(),
                )
            })
            .collect()
    }
}

/// A point-process descriptor.
#[derive(Clone)]
pub enum PointProcess {
    /// Exactly `count` uniform points.
    Binomial { count: usize },
    /// Homogeneous Poisson pattern with the given intensity per unit volume.
    Poisson { intensity: f64 },
    /// Offspring scattered around a parent pattern.
    Cluster {
        parent: Box<PointProcess>,
        offspring: Arc<dyn Offspring>,
    },
}

impl PointProcess {
    /// Thomas process: Poisson parents, Gaussian offspring.
    pub fn thomas(parent_intensity: f64, mean_children: f64, sigma: f64) -> Self {
        Self::Cluster {
            parent: Box::new(Self::Poisson {
                intensity: parent_intensity,
            }),
            offspring: Arc::new(GaussianOffspring {
                mean_count: mean_children,
                sigma,
            }),
        }
    }

    /// Neyman-Scott process: Poisson parents, uniform-ball offspring.
    pub fn neyman_scott(parent_intensity: f64, mean_children: f64, radius: f64) -> Self {
        Self::Cluster {
            parent: Box::new(Self::Poisson {
                intensity: parent_intensity,
            }),
            offspring: Arc::new(BallOffspring {
                mean_count: mean_children,
                radius,
            }),
        }
    }
}

/// Samples one realization of `process` inside `region`.
pub fn sample_points(seed: u64, process: &PointProcess, region: &BoundingBox) -> PointSet {
    let mut rng = StdRng::seed_from_u64(seed);
    PointSet::new(sample_into(process, region, &mut rng))
}

fn sample_into(process: &PointProcess, region: &BoundingBox, rng: &mut StdRng) -> Vec<Point> {
    match process {
        PointProcess::Binomial { count } => {
            (0..*count).map(|_| uniform_point(region, rng)).collect()
        }
        PointProcess::Poisson { intensity } => {
            let lambda = intensity * region.volume();
            let count = poisson_count(lambda, rng);
            (0..count).map(|_| uniform_point(region, rng)).collect()
        }
        PointProcess::Cluster { parent, offspring } => {
            let parents = sample_into(parent, region, rng);
            parents
                .iter()
                .flat_map(|p| offspring.offspring(p, rng))
                .filter(|child| region.contains(child))
                .collect()
        }
    }
}

fn uniform_point(region: &BoundingBox, rng: &mut StdRng) -> Point {
    Point::new(
        region
            .min
            .iter()
            .zip(region.max.iter())
            .map(|(&lo, &hi)| {
                let u: f64 = rng.random();
                lo + u * (hi - lo)
            })
            .collect(),
    )
}

fn poisson_count(lambda: f64, rng: &mut StdRng) -> usize {
    if !lambda.is_finite() || lambda <= 0.0 {
        return 0;
    }
    let dist = Poisson::new(lambda).expect("positive finite rate");
    dist.sample(rng) as usize
}
