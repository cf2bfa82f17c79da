//! Projection of the record stream into typed per-sample fields.
//!
//! Two views are offered. [`extract_fields`] compacts each field independently, so
//! index `i` of a sequence means "the i-th record carrying that field".
//! [`extract_activity`] keeps one slot per timed record with optional fields, which
//! is what the estimators consume.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::record::{Field, Record};

/// Semicircle to degree scale factor (`180 / 2^31`).
pub const SEMICIRCLE_TO_DEG: f64 = 180.0 / 2_147_483_648.0;

pub fn semicircles_to_degrees(raw: f64) -> f64 {
    raw * SEMICIRCLE_TO_DEG
}

/// Independently compacted field sequences.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub timestamps: Vec<DateTime<Utc>>,
    pub speeds: Vec<f64>,
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    pub altitudes: Vec<f64>,
}

/// One timed record with whatever the device reported alongside the timestamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub record_index: usize,
    pub timestamp: DateTime<Utc>,
    pub speed_mps: Option<f64>,
    pub latitude_deg: Option<f64>,
    pub longitude_deg: Option<f64>,
    pub altitude_m: Option<f64>,
}

impl Sample {
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.latitude_deg?, self.longitude_deg?))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub samples: Vec<Sample>,
    /// `record` messages dropped for lacking a timestamp.
    pub untimed_records: usize,
}

impl Activity {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.samples.iter().map(|s| s.timestamp).collect()
    }

    pub fn speeds(&self) -> Vec<Option<f64>> {
        self.samples.iter().map(|s| s.speed_mps).collect()
    }

    pub fn positions(&self) -> Vec<Option<(f64, f64)>> {
        self.samples.iter().map(Sample::position).collect()
    }

    pub fn altitudes(&self) -> Vec<Option<f64>> {
        self.samples.iter().map(|s| s.altitude_m).collect()
    }

    pub fn has_speed(&self) -> bool {
        self.samples.iter().any(|s| s.speed_mps.is_some())
    }

    pub fn has_positions(&self) -> bool {
        self.samples.iter().any(|s| s.position().is_some())
    }
}

#[derive(Default)]
struct RecordFields {
    timestamp: Option<DateTime<Utc>>,
    speed: Option<f64>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    altitude: Option<f64>,
}

fn read_record(record: &Record) -> RecordFields {
    let mut row = RecordFields::default();
    let mut plain_speed = None;
    let mut plain_altitude = None;
    for field in record.fields() {
        match field.name.as_str() {
            "timestamp" => {
                if let Some(ts) = field.value.as_timestamp() {
                    row.timestamp = Some(ts);
                }
            }
            "enhanced_speed" => row.speed = field.value.as_f64(),
            "speed" => plain_speed = field.value.as_f64(),
            "position_lat" => row.latitude = position_degrees(field),
            "position_long" => row.longitude = position_degrees(field),
            "enhanced_altitude" => row.altitude = field.value.as_f64(),
            "altitude" => plain_altitude = field.value.as_f64(),
            _ => {}
        }
    }
    row.speed = row.speed.or(plain_speed);
    row.altitude = row.altitude.or(plain_altitude);
    row
}

fn position_degrees(field: &Field) -> Option<f64> {
    let raw = field.value.as_f64()?;
    match field.units.as_deref() {
        Some("deg") | Some("degrees") => Some(raw),
        _ => Some(semicircles_to_degrees(raw)),
    }
}

/// Compact every field independently over all `record` messages.
pub fn extract_fields<'a, I>(records: I) -> ExtractedFields
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut out = ExtractedFields::default();
    for record in records.into_iter().filter(|r| r.is_sample()) {
        let row = read_record(record);
        if let Some(ts) = row.timestamp {
            out.timestamps.push(ts);
        }
        if let Some(speed) = row.speed {
            out.speeds.push(speed);
        }
        if let Some(lat) = row.latitude {
            out.latitudes.push(lat);
        }
        if let Some(lon) = row.longitude {
            out.longitudes.push(lon);
        }
        if let Some(alt) = row.altitude {
            out.altitudes.push(alt);
        }
    }
    out
}

/// Build the record-indexed activity: one [`Sample`] per timed `record` message.
pub fn extract_activity<'a, I>(records: I) -> Activity
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut activity = Activity::default();
    for (record_index, record) in records
        .into_iter()
        .filter(|r| r.is_sample())
        .enumerate()
    {
        let row = read_record(record);
        let Some(timestamp) = row.timestamp else {
            activity.untimed_records += 1;
            continue;
        };
        activity.samples.push(Sample {
            record_index,
            timestamp,
            speed_mps: row.speed,
            latitude_deg: row.latitude,
            longitude_deg: row.longitude,
            altitude_m: row.altitude,
        });
    }
    if activity.untimed_records > 0 {
        debug!(
            "dropped {} record messages without a timestamp",
            activity.untimed_records
        );
    }
    activity
}
