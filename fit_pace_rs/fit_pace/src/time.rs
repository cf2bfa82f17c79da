use chrono::{DateTime, Timelike, Utc};

use crate::PaceError;

/// Seconds elapsed since the first timestamp, with millisecond resolution.
pub fn normalize_time(timestamps: &[DateTime<Utc>]) -> Result<Vec<f64>, PaceError> {
    let start = *timestamps.first().ok_or(PaceError::EmptySeries)?;
    Ok(timestamps
        .iter()
        .map(|ts| (*ts - start).num_milliseconds() as f64 / 1000.0)
        .collect())
}

/// `HH:MM:SS`, truncating sub-second parts. Hours widen past 99 instead of wrapping.
pub fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Inverse of [`format_time`] for whole seconds.
pub fn parse_time(text: &str) -> Option<u64> {
    let mut parts = text.trim().split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds: u64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
        return None;
    }
    Some(hours * 3600 + minutes * 60 + seconds)
}

/// Wall-clock hour, minute and second of each timestamp, date stripped.
///
/// Library-only helper for callers that bucket samples by time of day; the
/// pipeline itself works on elapsed seconds.
pub fn split_clock(timestamps: &[DateTime<Utc>]) -> (Vec<u32>, Vec<u32>, Vec<u32>) {
    let mut hours = Vec::with_capacity(timestamps.len());
    let mut minutes = Vec::with_capacity(timestamps.len());
    let mut seconds = Vec::with_capacity(timestamps.len());
    for ts in timestamps {
        hours.push(ts.hour());
        minutes.push(ts.minute());
        seconds.push(ts.second());
    }
    (hours, minutes, seconds)
}

/// Elapsed delta to the previous sample; index 0 has no predecessor and gets `0.0`.
pub fn intervals(elapsed: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(elapsed.len());
    if elapsed.is_empty() {
        return out;
    }
    out.push(0.0);
    for w in elapsed.windows(2) {
        out.push(w[1] - w[0]);
    }
    out
}
