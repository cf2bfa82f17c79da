//! Displacement-based pace: geodesic stride between consecutive fixes, divided by
//! the time it took.

use geo::{Distance, Geodesic, Point};
use serde::{Deserialize, Serialize};

/// Time attributed to each stride when converting it into a pace.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum IntervalPolicy {
    /// Every stride is assumed to take this many seconds, regardless of timestamps.
    Fixed(f64),
    /// Each stride takes the real elapsed time since the previous sample.
    Elapsed,
}

impl Default for IntervalPolicy {
    fn default() -> Self {
        IntervalPolicy::Elapsed
    }
}

/// WGS84 geodesic distance in metres between two `(lat, lon)` pairs in degrees.
pub fn geodesic_distance(from: (f64, f64), to: (f64, f64)) -> f64 {
    if from == to {
        return 0.0;
    }
    // geo points are (x = lon, y = lat)
    let a = Point::new(from.1, from.0);
    let b = Point::new(to.1, to.0);
    Geodesic::distance(a, b)
}

/// Stride per sample. The first sample has no predecessor and strides `0`; a
/// missing fix on either end leaves the stride unknown.
pub fn stride_distances(positions: &[Option<(f64, f64)>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(positions.len());
    if positions.is_empty() {
        return out;
    }
    out.push(positions[0].map(|_| 0.0));
    for w in positions.windows(2) {
        out.push(match (w[0], w[1]) {
            (Some(prev), Some(cur)) => Some(geodesic_distance(prev, cur)),
            _ => None,
        });
    }
    out
}

/// `1000 * dt / (60 * stride)` minutes per kilometer.
///
/// `intervals` is only read under [`IntervalPolicy::Elapsed`] and must then be
/// index-aligned with `strides`. Zero or unknown strides, and non-positive
/// intervals, give an undefined pace.
pub fn displacement_paces(
    strides: &[Option<f64>],
    intervals: &[f64],
    policy: IntervalPolicy,
) -> Vec<Option<f64>> {
    strides
        .iter()
        .enumerate()
        .map(|(i, stride)| {
            let stride = stride.filter(|d| d.is_finite() && *d > 0.0)?;
            let dt = match policy {
                IntervalPolicy::Fixed(seconds) => seconds,
                IntervalPolicy::Elapsed => *intervals.get(i)?,
            };
            if !(dt.is_finite() && dt > 0.0) {
                return None;
            }
            Some(1000.0 * dt / (60.0 * stride))
        })
        .collect()
}
