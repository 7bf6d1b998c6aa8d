//! Neighborhood search over domain centroids.
//!
//! The index buckets element centroids on a coarse uniform lattice and
//! answers k-nearest queries by expanding Chebyshev rings of buckets around
//! the query point, pruning once the next ring cannot improve the current
//! k-th best distance. Queries honor a per-call availability mask
//! (`mask[i] == true` means element `i` is eligible) and an optional metric
//! ball that both restricts membership and defines the ordering metric.
//! The index is immutable after construction.

use crate::geometry::{Domain, MetricBall, Point};

#[derive(Debug, Clone)]
pub struct NeighborhoodIndex {
    centroids: Vec<Point>,
    bbox_min: Vec<f64>,
    bins: Vec<usize>,
    cell: Vec<f64>,
    buckets: Vec<Vec<u32>>,
}

impl NeighborhoodIndex {
    pub fn new(domain: &Domain) -> Self {
        let centroids = domain.centroids();
        let bbox = domain.bounding_box();
        let nd = bbox.ndims();
        let n = centroids.len();

        // About four elements per occupied bucket, capped per axis.
        let per_axis = ((n as f64 / 4.0).powf(1.0 / nd as f64).floor() as usize).clamp(1, 64);
        let sides = bbox.sides();
        let bins = vec![per_axis; nd];
        let cell = sides
            .iter()
            .map(|&s| if s > 0.0 { s / per_axis as f64 } else { 1.0 })
            .collect::<Vec<_>>();

        let mut buckets = vec![Vec::new(); bins.iter().product::<usize>()];
        for (i, p) in centroids.iter().enumerate() {
            let b = Self::bucket_of(p.coords(), &bbox.min, &cell, &bins);
            buckets[b].push(i as u32);
        }

        Self {
            centroids,
            bbox_min: bbox.min,
            bins,
            cell,
            buckets,
        }
    }

    pub fn element_count(&self) -> usize {
        self.centroids.len()
    }

    pub fn centroid(&self, i: usize) -> &Point {
        &self.centroids[i]
    }

    fn bucket_of(coords: &[f64], min: &[f64], cell: &[f64], bins: &[usize]) -> usize {
        let mut index = 0;
        let mut stride = 1;
        for k in 0..coords.len() {
            let mut b = ((coords[k] - min[k]) / cell[k]).floor() as isize;
            b = b.clamp(0, bins[k] as isize - 1);
            index += b as usize * stride;
            stride *= bins[k];
        }
        index
    }

    fn bucket_coords(&self, p: &Point) -> Vec<isize> {
        p.coords()
            .iter()
            .enumerate()
            .map(|(k, &c)| {
                (((c - self.bbox_min[k]) / self.cell[k]).floor() as isize)
                    .clamp(0, self.bins[k] as isize - 1)
            })
            .collect()
    }

    /// Up to `k` eligible elements nearest to `point`.
    ///
    /// Ordering is by ascending distance (ball-normalized when `ball` is
    /// given, Euclidean otherwise), ties broken by ascending index.
    pub fn search(
        &self,
        point: &Point,
        k: usize,
        mask: &[bool],
        ball: Option<&MetricBall>,
    ) -> Vec<usize> {
        if k == 0 {
            return Vec::new();
        }
        let nd = self.bins.len();
        let home = self.bucket_coords(point);
        let min_cell = self.cell.iter().copied().fold(f64::INFINITY, f64::min);
        let max_ring = *self.bins.iter().max().expect("index has at least one axis") as isize;

        // (distance, index) candidates, kept sorted with the worst last.
        let mut best: Vec<(f64, usize)> = Vec::with_capacity(k + 1);

        for ring in 0..=max_ring {
            if self.ring_is_prunable(ring, min_cell, k, &best, ball) {
                break;
            }
            self.visit_ring(&home, ring, nd, |bucket| {
                for &raw in &self.buckets[bucket] {
                    let i = raw as usize;
                    if !mask[i] {
                        continue;
                    }
                    let q = &self.centroids[i];
                    let dist = match ball {
                        Some(b) => {
                            let d = b.normalized_distance(point, q);
                            if d > 1.0 {
                                continue;
                            }
                            d
                        }
                        None => point.distance(q),
                    };
                    let entry = (dist, i);
                    let pos = best
                        .partition_point(|&(d, j)| d < dist || (d == dist && j < i));
                    if pos < k {
                        best.insert(pos, entry);
                        best.truncate(k);
                    }
                }
            });
        }

        best.into_iter().map(|(_, i)| i).collect()
    }

    /// No bucket at `ring` can hold a closer candidate than what we have.
    fn ring_is_prunable(
        &self,
        ring: isize,
        min_cell: f64,
        k: usize,
        best: &[(f64, usize)],
        ball: Option<&MetricBall>,
    ) -> bool {
        if ring < 2 {
            return false;
        }
        let euclid_floor = (ring - 1) as f64 * min_cell;
        if let Some(b) = ball {
            // A normalized distance of 1 bounds ball membership.
            let norm_floor = euclid_floor / b.max_radius();
            if norm_floor > 1.0 {
                return true;
            }
            if best.len() == k && norm_floor > best[k - 1].0 {
                return true;
            }
            false
        } else {
            best.len() == k && euclid_floor > best[k - 1].0
        }
    }

    /// Invokes `f` with every in-range bucket whose Chebyshev distance from
    /// `home` is exactly `ring`.
    fn visit_ring(&self, home: &[isize], ring: isize, nd: usize, mut f: impl FnMut(usize)) {
        let mut offset = vec![-ring; nd];
        loop {
            if offset.iter().map(|o| o.abs()).max() == Some(ring) {
                let mut ok = true;
                let mut bucket = 0;
                let mut stride = 1;
                for (axis, &o) in offset.iter().enumerate() {
                    let b = home[axis] + o;
                    if b < 0 || b >= self.bins[axis] as isize {
                        ok = false;
                        break;
                    }
                    bucket += b as usize * stride;
                    stride *= self.bins[axis];
                }
                if ok {
                    f(bucket);
                }
            }

            // Odometer increment over the cube [-ring, ring]^nd.
            let mut axis = 0;
            loop {
                if axis == nd {
                    return;
                }
                offset[axis] += 1;
                if offset[axis] <= ring {
                    break;
                }
                offset[axis] = -ring;
                axis += 1;
            }
        }
    }
}
