use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use fit_pace::{pace_label, PaceReport};

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{:.*}", precision, v))
        .unwrap_or_else(|| "".into())
}

fn at<T: Copy>(series: Option<&Vec<Option<T>>>, i: usize) -> Option<T> {
    series.and_then(|s| s.get(i).copied().flatten())
}

pub fn write_pace_csv(report: &PaceReport, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);
    write_pace_rows(report, &mut writer)
}

pub fn write_pace_rows<W: Write>(report: &PaceReport, writer: &mut csv::Writer<W>) -> Result<()> {
    writer.write_record([
        "record_index",
        "elapsed_s",
        "clock",
        "altitude_m",
        "speed_mps",
        "speed_pace_min_km",
        "speed_pace",
        "latitude",
        "longitude",
        "stride_m",
        "displacement_pace_min_km",
        "smoothed_pace_min_km",
        "smoothed_pace",
    ])?;

    let displacement = report.displacement.as_ref();
    for i in 0..report.len() {
        let speed_pace = at(report.speed_paces.as_ref(), i);
        let smoothed = at(displacement.map(|d| &d.smoothed_paces), i);
        writer.write_record([
            report.record_indices[i].to_string(),
            format!("{:.3}", report.elapsed_s[i]),
            report.clock[i].clone(),
            fmt_opt(report.altitudes_m.get(i).copied().flatten(), 1),
            fmt_opt(at(report.speeds_mps.as_ref(), i), 3),
            fmt_opt(speed_pace, 3),
            pace_label(speed_pace),
            fmt_opt(at(displacement.map(|d| &d.latitudes), i), 6),
            fmt_opt(at(displacement.map(|d| &d.longitudes), i), 6),
            fmt_opt(at(displacement.map(|d| &d.strides_m), i), 3),
            fmt_opt(at(displacement.map(|d| &d.raw_paces), i), 3),
            fmt_opt(smoothed, 3),
            pace_label(smoothed),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
