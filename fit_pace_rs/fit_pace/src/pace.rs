//! Pace in minutes per kilometer, and the speed-based estimator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Minutes needed to cover one kilometer.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Pace(f64);

impl Pace {
    /// `None` for zero, negative or non-finite values: there is no finite pace to report.
    pub fn from_min_per_km(value: f64) -> Option<Self> {
        (value.is_finite() && value > 0.0).then_some(Pace(value))
    }

    pub fn min_per_km(self) -> f64 {
        self.0
    }

    pub fn minutes(self) -> u64 {
        self.0.floor() as u64
    }

    /// Residual seconds within the minute, `(pace - floor(pace)) * 60`.
    pub fn seconds(self) -> f64 {
        (self.0 - self.0.floor()) * 60.0
    }

    /// `M:SS` with truncated seconds.
    pub fn label(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Pace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.minutes(), self.seconds() as u64)
    }
}

/// `60000 / (3600 * s)`; a stationary sample has no pace.
pub fn speed_to_pace(speed_mps: f64) -> Option<Pace> {
    if !(speed_mps.is_finite() && speed_mps > 0.0) {
        return None;
    }
    Pace::from_min_per_km(60_000.0 / (3600.0 * speed_mps))
}

pub fn speed_paces(speeds: &[Option<f64>]) -> Vec<Option<f64>> {
    speeds
        .iter()
        .map(|s| s.and_then(speed_to_pace).map(Pace::min_per_km))
        .collect()
}

/// Display label for an optional pace, `-` when undefined.
pub fn pace_label(pace: Option<f64>) -> String {
    pace.and_then(Pace::from_min_per_km)
        .map(Pace::label)
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_kmh_is_six_minutes() {
        let pace = speed_to_pace(10.0 / 3.6).unwrap();
        assert!((pace.min_per_km() - 6.0).abs() < 1e-9);
        assert!((speed_to_pace(2.778).unwrap().min_per_km() - 6.0).abs() < 1e-3);
        assert_eq!(Pace::from_min_per_km(6.0).unwrap().label(), "6:00");
    }

    #[test]
    fn zero_speed_is_undefined() {
        assert!(speed_to_pace(0.0).is_none());
        assert!(speed_to_pace(-1.0).is_none());
        assert!(speed_to_pace(f64::NAN).is_none());
    }

    #[test]
    fn display_split_is_lossless() {
        let pace = Pace::from_min_per_km(5.5).unwrap();
        assert_eq!(pace.minutes(), 5);
        assert!((pace.seconds() - 30.0).abs() < 1e-9);
        let rebuilt = pace.minutes() as f64 + pace.seconds() / 60.0;
        assert!((rebuilt - pace.min_per_km()).abs() < 1e-12);
        assert_eq!(pace.to_string(), "5:30");
    }

    #[test]
    fn series_propagates_gaps() {
        let paces = speed_paces(&[Some(2.0), None, Some(4.0), Some(0.0)]);
        assert!((paces[0].unwrap() - 8.333_333).abs() < 1e-5);
        assert_eq!(paces[1], None);
        assert!((paces[2].unwrap() - 4.166_666).abs() < 1e-5);
        assert_eq!(paces[3], None);
        assert_eq!(pace_label(Some(4.25)), "4:15");
        assert_eq!(pace_label(Some(0.0)), "-");
        assert_eq!(pace_label(None), "-");
    }
}
