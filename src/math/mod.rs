//! Numerical utilities shared by the simulation engines.

pub mod pairwise;
pub mod rng;
pub mod scaling;
