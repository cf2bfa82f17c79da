//! FIT and GPX decoders producing the neutral [`Record`] stream.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::record::{Field, FieldValue, Record, RECORD_KIND};
use crate::PaceError;

/// Decode FIT or GPX bytes using the provided format hint (extension or file name).
pub fn parse_records(input: &[u8], format: &str) -> Result<Vec<Record>, PaceError> {
    let format_lc = format.to_ascii_lowercase();
    if format_lc.ends_with(".fit") || format_lc == "fit" {
        parse_fit_records(input)
    } else if format_lc.ends_with(".gpx") || format_lc == "gpx" {
        parse_gpx_records(input)
    } else {
        Err(PaceError::UnsupportedFormat(format.to_string()))
    }
}

fn parse_fit_records(input: &[u8]) -> Result<Vec<Record>, PaceError> {
    use fitparser::de::from_bytes;
    use fitparser::profile::MesgNum;

    let messages = from_bytes(input).map_err(|e| PaceError::FitParse(e.to_string()))?;
    let mut out = Vec::with_capacity(messages.len());
    for message in messages.into_iter() {
        let kind = if message.kind() == MesgNum::Record {
            RECORD_KIND.to_string()
        } else {
            format!("{:?}", message.kind()).to_ascii_lowercase()
        };
        let mut record = Record::new(kind);
        for field in message.fields() {
            record.fields.push(
                Field::new(field.name(), fit_value(field.value())).with_units(field.units()),
            );
        }
        out.push(record);
    }
    debug!("decoded {} FIT messages", out.len());
    Ok(out)
}

fn fit_value(value: &fitparser::Value) -> FieldValue {
    use fitparser::Value;
    match value {
        Value::Timestamp(ts) => FieldValue::Timestamp(ts.with_timezone(&Utc)),
        Value::Float32(v) => FieldValue::Float(*v as f64),
        Value::Float64(v) => FieldValue::Float(*v),
        Value::SInt8(v) => FieldValue::Integer(*v as i64),
        Value::SInt16(v) => FieldValue::Integer(*v as i64),
        Value::SInt32(v) => FieldValue::Integer(*v as i64),
        Value::SInt64(v) => FieldValue::Integer(*v),
        Value::Byte(v) | Value::UInt8(v) | Value::UInt8z(v) | Value::Enum(v) => {
            FieldValue::Integer(*v as i64)
        }
        Value::UInt16(v) | Value::UInt16z(v) => FieldValue::Integer(*v as i64),
        Value::UInt32(v) | Value::UInt32z(v) => FieldValue::Integer(*v as i64),
        Value::UInt64(v) | Value::UInt64z(v) => match i64::try_from(*v) {
            Ok(v) => FieldValue::Integer(v),
            Err(_) => FieldValue::Float(*v as f64),
        },
        Value::String(s) => FieldValue::Text(s.clone()),
        // multi-valued fields report their first numeric element
        Value::Array(values) => values
            .iter()
            .map(fit_value)
            .find(|v| v.as_f64().is_some())
            .unwrap_or_else(|| FieldValue::Other(format!("{:?}", value))),
        other => FieldValue::Other(format!("{:?}", other)),
    }
}

fn parse_gpx_records(input: &[u8]) -> Result<Vec<Record>, PaceError> {
    use gpx::read;
    use std::io::Cursor;

    let mut cursor = Cursor::new(input);
    let gpx = read(&mut cursor).map_err(|e| PaceError::GpxParse(e.to_string()))?;
    let mut out = Vec::new();

    for track in gpx.tracks {
        for segment in track.segments {
            for point in segment.points {
                let mut record = Record::new(RECORD_KIND);
                if let Some(time) = point.time {
                    let iso = time
                        .format()
                        .map_err(|e| PaceError::GpxParse(e.to_string()))?;
                    let utc = DateTime::parse_from_rfc3339(&iso)
                        .map_err(|e| PaceError::GpxParse(e.to_string()))?
                        .with_timezone(&Utc);
                    record
                        .fields
                        .push(Field::new("timestamp", FieldValue::Timestamp(utc)));
                }
                let point_geo = point.point();
                record.fields.push(
                    Field::new("position_lat", FieldValue::Float(point_geo.y()))
                        .with_units("degrees"),
                );
                record.fields.push(
                    Field::new("position_long", FieldValue::Float(point_geo.x()))
                        .with_units("degrees"),
                );
                if let Some(ele) = point.elevation {
                    record.fields.push(
                        Field::new("enhanced_altitude", FieldValue::Float(ele)).with_units("m"),
                    );
                }
                out.push(record);
            }
        }
    }
    debug!("decoded {} GPX track points", out.len());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk><trkseg>
    <trkpt lat="52.0" lon="4.0"><ele>3.5</ele><time>2024-05-01T08:00:00Z</time></trkpt>
    <trkpt lat="52.0001" lon="4.0"><time>2024-05-01T08:00:01Z</time></trkpt>
  </trkseg></trk>
</gpx>"#;

    #[test]
    fn unknown_extension_is_rejected() {
        let err = parse_records(b"", "activity.tcx").unwrap_err();
        assert!(matches!(err, PaceError::UnsupportedFormat(_)));
    }

    #[test]
    fn garbage_fit_is_a_decode_failure() {
        let err = parse_records(b"definitely not a fit file", "run.FIT").unwrap_err();
        assert!(matches!(err, PaceError::FitParse(_)));
    }

    #[test]
    fn fit_values_map_to_neutral_fields() {
        use chrono::{Local, TimeZone};
        use fitparser::Value;

        let utc = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        assert_eq!(
            fit_value(&Value::Timestamp(utc.with_timezone(&Local))),
            FieldValue::Timestamp(utc)
        );
        assert_eq!(
            fit_value(&Value::SInt32(-536_870_912)),
            FieldValue::Integer(-536_870_912)
        );
        assert_eq!(fit_value(&Value::UInt64(42)), FieldValue::Integer(42));
        assert_eq!(
            fit_value(&Value::UInt64(u64::MAX)),
            FieldValue::Float(u64::MAX as f64)
        );
        assert_eq!(fit_value(&Value::Float32(2.5)), FieldValue::Float(2.5));
    }

    #[test]
    fn array_fields_take_the_first_numeric_element() {
        use fitparser::Value;

        let speed = fit_value(&Value::Array(vec![Value::UInt16(2500)]));
        assert_eq!(speed, FieldValue::Integer(2500));
        assert_eq!(speed.as_f64(), Some(2500.0));

        let mixed = Value::Array(vec![Value::String("n/a".into()), Value::Float64(3.25)]);
        assert_eq!(fit_value(&mixed), FieldValue::Float(3.25));

        let empty = fit_value(&Value::Array(Vec::new()));
        assert!(matches!(empty, FieldValue::Other(_)));
        assert_eq!(empty.as_f64(), None);
    }

    #[test]
    fn gpx_points_become_records_in_degrees() {
        let records = parse_records(GPX.as_bytes(), "gpx").unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(Record::is_sample));

        let first = &records[0];
        let lat = first.field("position_lat").unwrap();
        assert_eq!(lat.value, FieldValue::Float(52.0));
        assert_eq!(lat.units.as_deref(), Some("degrees"));
        assert!(first.field("enhanced_altitude").is_some());
        assert!(records[1].field("enhanced_altitude").is_none());
        assert!(records[1].field("timestamp").unwrap().value.as_timestamp().is_some());
    }
}
