//! Pace-over-time scatter: interactive plotly HTML plus an optional plotters PNG.

use std::panic;
use std::path::Path;

use anyhow::{anyhow, Result};
use fit_pace::{format_time, pace_label, Pace, PaceReport};
use plotly::common::{HoverInfo, Marker, Mode};
use plotly::layout::Axis;
use plotly::{Layout, Plot, Scatter};
use plotters::prelude::*;

const MAX_TICKS: usize = 10;

#[derive(Clone, Debug)]
pub struct ChartSeries {
    pub label: &'static str,
    /// Plottable paces; warm-up sentinels and undefined samples are gaps.
    pub values: Vec<Option<f64>>,
    pub hover: Vec<String>,
    pub color: RGBColor,
}

pub fn chart_series(report: &PaceReport) -> Vec<ChartSeries> {
    let mut series = Vec::new();
    if let Some(paces) = report.speed_paces.as_ref() {
        series.push(build_series(report, "Speed pace", paces, RGBColor(31, 119, 180)));
    }
    if let Some(d) = report.displacement.as_ref() {
        series.push(build_series(
            report,
            "Displacement pace (smoothed)",
            &d.smoothed_paces,
            RGBColor(214, 39, 40),
        ));
    }
    series
}

fn build_series(
    report: &PaceReport,
    label: &'static str,
    paces: &[Option<f64>],
    color: RGBColor,
) -> ChartSeries {
    let values: Vec<Option<f64>> = paces
        .iter()
        .map(|p| p.and_then(Pace::from_min_per_km).map(Pace::min_per_km))
        .collect();
    let hover = values
        .iter()
        .zip(report.clock.iter())
        .map(|(p, clock)| format!("{}<br>{} min/km", clock, pace_label(*p)))
        .collect();
    ChartSeries {
        label,
        values,
        hover,
        color,
    }
}

/// Tick positions every `len / 10` samples with their clock labels.
pub fn time_ticks(elapsed: &[f64]) -> (Vec<f64>, Vec<String>) {
    let num_ticks = MAX_TICKS.min(elapsed.len()).max(1);
    let step = (elapsed.len() / num_ticks).max(1);
    elapsed
        .iter()
        .step_by(step)
        .map(|&t| (t, format_time(t)))
        .unzip()
}

fn pace_bounds(series: &[ChartSeries]) -> Option<(f64, f64)> {
    let values = series.iter().flat_map(|s| s.values.iter().flatten().copied());
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

pub fn pace_chart(report: &PaceReport) -> Plot {
    let series = chart_series(report);
    let (tick_values, tick_text) = time_ticks(&report.elapsed_s);

    let mut y_axis = Axis::new().title("Pace [min:sec per km]");
    if let Some((lo, hi)) = pace_bounds(&series) {
        let pad = ((hi - lo) * 0.05).max(0.1);
        // slower paces at the bottom
        y_axis = y_axis.range(vec![hi + pad, (lo - pad).max(0.0)]);
    }
    let layout = Layout::new()
        .title("Pace over Time")
        .show_legend(true)
        .auto_size(true)
        .x_axis(
            Axis::new()
                .title("Time [hh:mm:ss]")
                .tick_values(tick_values)
                .tick_text(tick_text),
        )
        .y_axis(y_axis);

    let mut plot = Plot::new();
    for s in series {
        let trace = Scatter::new(report.elapsed_s.clone(), s.values)
            .mode(Mode::Markers)
            .name(s.label)
            .marker(Marker::new().size(5))
            .hover_text_array(s.hover)
            .hover_info(HoverInfo::Text);
        plot.add_trace(trace);
    }
    plot.set_layout(layout);
    plot
}

pub fn pace_chart_html(report: &PaceReport) -> String {
    pace_chart(report).to_html()
}

/// Render the PNG, turning backend panics (e.g. missing fonts) into errors.
pub fn render_png_guard(report: &PaceReport, path: &Path) -> Result<(), String> {
    let render = || render_png(report, path).map_err(|e| format!("plotting error: {}", e));
    panic::catch_unwind(panic::AssertUnwindSafe(render))
        .map_err(|_| "plotting backend panicked".to_string())?
}

fn render_png(report: &PaceReport, path: &Path) -> Result<()> {
    let series = chart_series(report);
    let (lo, hi) =
        pace_bounds(&series).ok_or_else(|| anyhow!("no defined pace samples to plot"))?;
    let x_max = report.elapsed_s.last().copied().unwrap_or(0.0).max(1.0);
    let pad = ((hi - lo) * 0.05).max(0.1);

    let root = BitMapBackend::new(path, (1280, 720)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Pace over Time", ("sans-serif", 28))
        .margin(25)
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(0.0..x_max, (hi + pad)..(lo - pad).max(0.0))?;

    chart
        .configure_mesh()
        .x_desc("Time [hh:mm:ss]")
        .y_desc("Pace [min:sec per km]")
        .x_label_formatter(&|v| format_time(*v))
        .y_label_formatter(&|v| pace_label(Some(*v)))
        .draw()?;

    for s in &series {
        let color = s.color;
        let points: Vec<(f64, f64)> = report
            .elapsed_s
            .iter()
            .zip(s.values.iter())
            .filter_map(|(&t, v)| Some((t, (*v)?)))
            .collect();
        chart
            .draw_series(
                points
                    .into_iter()
                    .map(move |p| Circle::new(p, 2, color.filled())),
            )?
            .label(s.label)
            .legend(move |(x, y)| Circle::new((x + 10, y), 4, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}
