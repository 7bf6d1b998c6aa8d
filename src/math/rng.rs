//! Reproducible per-realization random streams.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

/// SplitMix64 mixer used to derive independent child seeds.
#[derive(Debug, Clone)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

/// Stable child seed for realization `index` under parent `seed`.
///
/// The derivation is a pure function of `(seed, index)`, so ensembles are
/// bit-identical regardless of how realizations are scheduled over workers.
#[inline]
pub fn child_seed(seed: u64, index: usize) -> u64 {
    let mut mixer = SplitMix64::new(seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    mixer.next_u64()
}

/// PRNG for one realization.
pub fn child_rng(seed: u64, index: usize) -> StdRng {
    StdRng::seed_from_u64(child_seed(seed, index))
}

/// Fills a buffer with standard-normal draws.
pub fn standard_normals(rng: &mut StdRng, n: usize) -> Vec<f64> {
    let dist = StandardNormal;
    (0..n).map(|_| dist.sample(rng)).collect()
}
