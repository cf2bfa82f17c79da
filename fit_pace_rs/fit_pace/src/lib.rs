//! Core pace-series computation for FIT/GPX running activities.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod decode;
pub mod extract;
pub mod pace;
pub mod record;
pub mod smoothing;
pub mod stride;
pub mod time;

pub use decode::parse_records;
pub use extract::{extract_activity, extract_fields, Activity, ExtractedFields, Sample};
pub use pace::{pace_label, speed_paces, speed_to_pace, Pace};
pub use record::{Field, FieldValue, Record};
pub use smoothing::{rolling_mean, DEFAULT_WINDOW, WARMUP_SENTINEL};
pub use stride::{displacement_paces, geodesic_distance, stride_distances, IntervalPolicy};
pub use time::{format_time, intervals, normalize_time, parse_time, split_clock};

#[derive(Error, Debug)]
pub enum PaceError {
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to parse FIT file: {0}")]
    FitParse(String),
    #[error("failed to parse GPX file: {0}")]
    GpxParse(String),
    #[error("required field absent from every record: {0}")]
    MissingField(&'static str),
    #[error("time normalization needs at least one timestamp")]
    EmptySeries,
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Params {
    /// Trailing window applied to the displacement pace.
    pub window: usize,
    pub interval: IntervalPolicy,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            interval: IntervalPolicy::Elapsed,
        }
    }
}

/// Displacement estimator output, aligned with the report's samples.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DisplacementSeries {
    pub latitudes: Vec<Option<f64>>,
    pub longitudes: Vec<Option<f64>>,
    pub strides_m: Vec<Option<f64>>,
    pub raw_paces: Vec<Option<f64>>,
    pub smoothed_paces: Vec<Option<f64>>,
}

/// Everything the presentation layer needs, one entry per sample.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaceReport {
    pub params: Params,
    pub record_indices: Vec<usize>,
    pub elapsed_s: Vec<f64>,
    pub clock: Vec<String>,
    pub altitudes_m: Vec<Option<f64>>,
    /// `None` when the recording carries no speed at all.
    pub speeds_mps: Option<Vec<Option<f64>>>,
    pub speed_paces: Option<Vec<Option<f64>>>,
    /// `None` when the recording carries no position at all.
    pub displacement: Option<DisplacementSeries>,
}

impl PaceReport {
    pub fn len(&self) -> usize {
        self.elapsed_s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elapsed_s.is_empty()
    }

    /// `(lat, lon)` fixes in sample order, gaps skipped.
    pub fn track(&self) -> Vec<(f64, f64)> {
        match self.displacement.as_ref() {
            Some(d) => d
                .latitudes
                .iter()
                .zip(d.longitudes.iter())
                .filter_map(|(lat, lon)| Some(((*lat)?, (*lon)?)))
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Run both pace estimators over an extracted activity.
///
/// Timestamps are mandatory. A recording without speed skips the speed estimator and
/// one without positions skips the displacement estimator; losing both is an error.
pub fn analyze(activity: &Activity, params: &Params) -> Result<PaceReport, PaceError> {
    if params.window == 0 {
        return Err(PaceError::InvalidParameter(
            "smoothing window must be at least 1".into(),
        ));
    }
    if let IntervalPolicy::Fixed(seconds) = params.interval {
        if !(seconds.is_finite() && seconds > 0.0) {
            return Err(PaceError::InvalidParameter(format!(
                "fixed sampling interval must be positive, got {}",
                seconds
            )));
        }
    }
    if activity.is_empty() {
        return Err(PaceError::MissingField("timestamp"));
    }

    let has_speed = activity.has_speed();
    let has_positions = activity.has_positions();
    if !has_speed && !has_positions {
        return Err(PaceError::MissingField("speed or position"));
    }

    let elapsed_s = normalize_time(&activity.timestamps())?;
    let clock = elapsed_s.iter().map(|&t| format_time(t)).collect();

    let (speeds_mps, speed_paces) = if has_speed {
        let speeds = activity.speeds();
        let paces = speed_paces(&speeds);
        debug!(
            "speed pace: {} of {} samples defined",
            paces.iter().filter(|p| p.is_some()).count(),
            paces.len()
        );
        (Some(speeds), Some(paces))
    } else {
        warn!("no speed field in recording; skipping speed-based pace");
        (None, None)
    };

    let displacement = if has_positions {
        let positions = activity.positions();
        let strides_m = stride_distances(&positions);
        let raw_paces = displacement_paces(&strides_m, &intervals(&elapsed_s), params.interval);
        let smoothed_paces = rolling_mean(&raw_paces, params.window)?;
        debug!(
            "displacement pace: {} of {} samples defined",
            raw_paces.iter().filter(|p| p.is_some()).count(),
            raw_paces.len()
        );
        Some(DisplacementSeries {
            latitudes: activity.samples.iter().map(|s| s.latitude_deg).collect(),
            longitudes: activity.samples.iter().map(|s| s.longitude_deg).collect(),
            strides_m,
            raw_paces,
            smoothed_paces,
        })
    } else {
        warn!("no position fields in recording; skipping displacement-based pace");
        None
    };

    Ok(PaceReport {
        params: params.clone(),
        record_indices: activity.samples.iter().map(|s| s.record_index).collect(),
        elapsed_s,
        clock,
        altitudes_m: activity.altitudes(),
        speeds_mps,
        speed_paces,
        displacement,
    })
}
