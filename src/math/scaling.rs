//! Unit-extent rescaling for numerical stability.
//!
//! Large absolute coordinates make dense covariance systems ill-conditioned,
//! so every engine first rescales its inputs by `alpha = 1 / max(domain
//! extent, function range)` and works in the unit frame. Conditioning data is
//! bound onto domain elements before any engine algebra runs, so the domain
//! extent covers the data extent.

use crate::functions::GeoFunction;
use crate::geometry::{Domain, MetricBall};

/// A consistently rescaled problem frame.
#[derive(Debug, Clone)]
pub struct ScaledFrame {
    pub domain: Domain,
    pub func: GeoFunction,
    pub ball: Option<MetricBall>,
    pub alpha: f64,
}

/// Rescales domain, function, and optional metric ball to unit extent.
pub fn unit_scale(domain: &Domain, func: &GeoFunction, ball: Option<&MetricBall>) -> ScaledFrame {
    let extent = domain.bounding_box().max_side();
    let scale = extent.max(func.range());
    let alpha = if scale.is_finite() && scale > 0.0 {
        1.0 / scale
    } else {
        1.0
    };
    ScaledFrame {
        domain: domain.scale(alpha),
        func: func.scale(alpha),
        ball: ball.map(|b| b.scale(alpha)),
        alpha,
    }
}
