use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, ValueEnum, ValueHint};
use fit_pace::{analyze, extract_activity, parse_records, IntervalPolicy, Params, Record};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod chart;
mod export;
mod map;

const CHART_FILE: &str = "pace_chart.html";
const MAP_FILE: &str = "route_map.html";
const CSV_FILE: &str = "pace.csv";

#[derive(Parser, Debug)]
#[command(author, version, about = "Running pace chart and route map from a FIT/GPX activity", long_about = None)]
struct Cli {
    /// FIT/GPX activity file
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Directory receiving the chart, map and CSV
    #[arg(short, long, default_value = ".", value_hint = ValueHint::DirPath)]
    out_dir: PathBuf,

    /// Smoothing window (samples) for displacement pace
    #[arg(long)]
    window: Option<usize>,

    /// Time attributed to each stride
    #[arg(long, value_enum)]
    interval: Option<IntervalOpt>,

    /// Seconds per sample for `--interval fixed`
    #[arg(long, default_value_t = 1.0)]
    fixed_seconds: f64,

    /// Also render a static PNG chart
    #[arg(long, value_hint = ValueHint::FilePath)]
    png: Option<PathBuf>,

    /// Skip the route map
    #[arg(long, action = ArgAction::SetTrue)]
    no_map: bool,

    /// Parameters JSON (flags override it)
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Print every record message and exit
    #[arg(long, action = ArgAction::SetTrue)]
    dump: bool,

    /// Verbose logging
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, ValueEnum)]
enum IntervalOpt {
    /// Assume a constant cadence (`--fixed-seconds`)
    Fixed,
    /// Use the real time between samples
    Elapsed,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    if cli.dump {
        handle_dump(&cli.input)
    } else {
        handle_pace(&cli)
    }
}

fn read_records(path: &Path) -> Result<Vec<Record>> {
    let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let hint = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("fit");
    parse_records(&data, hint).with_context(|| format!("failed to parse {}", path.display()))
}

fn load_params(path: &Path) -> Result<Params> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not a valid config", path.display()))
}

fn build_params(cli: &Cli) -> Result<Params> {
    let mut params = match cli.config.as_ref() {
        Some(path) => load_params(path)?,
        None => Params::default(),
    };
    if let Some(window) = cli.window {
        params.window = window;
    }
    match cli.interval {
        Some(IntervalOpt::Fixed) => params.interval = IntervalPolicy::Fixed(cli.fixed_seconds),
        Some(IntervalOpt::Elapsed) => params.interval = IntervalPolicy::Elapsed,
        None => {}
    }
    if params.window == 0 {
        return Err(anyhow!("--window must be at least 1"));
    }
    Ok(params)
}

fn handle_pace(cli: &Cli) -> Result<()> {
    let params = build_params(cli)?;
    debug!("parameters: {:?}", params);

    let t_parse = Instant::now();
    let records = read_records(&cli.input)?;
    let activity = extract_activity(&records);
    info!(
        "Parsed {}: {} samples ({} untimed records dropped) in {:.1} ms",
        cli.input.display(),
        activity.len(),
        activity.untimed_records,
        t_parse.elapsed().as_secs_f64() * 1000.0
    );

    let report = analyze(&activity, &params)
        .with_context(|| format!("cannot derive pace from {}", cli.input.display()))?;
    if let Some(last) = report.clock.last() {
        info!("Activity duration {}", last);
    }

    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("failed to create {}", cli.out_dir.display()))?;

    let csv_path = cli.out_dir.join(CSV_FILE);
    export::write_pace_csv(&report, &csv_path)?;
    info!("Wrote pace CSV: {}", csv_path.display());

    let chart_path = cli.out_dir.join(CHART_FILE);
    write_text(&chart_path, &chart::pace_chart_html(&report))?;
    info!("Wrote pace chart: {}", chart_path.display());

    if let Some(path) = cli.png.as_ref() {
        if let Err(err) = chart::render_png_guard(&report, path) {
            warn!("Skipping PNG render ({}): {}", path.display(), err);
        } else {
            info!("Wrote plot: {}", path.display());
        }
    }

    if !cli.no_map {
        let track = report.track();
        if track.is_empty() {
            warn!("No positions recorded; skipping route map");
        } else {
            let map_path = cli.out_dir.join(MAP_FILE);
            write_text(&map_path, &map::route_map_html(&track)?)?;
            info!("Wrote route map: {}", map_path.display());
        }
    }

    Ok(())
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

fn handle_dump(path: &Path) -> Result<()> {
    let records = read_records(path)?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let mut count = 0usize;
    for record in records.iter().filter(|r| r.is_sample()) {
        writeln!(handle, "{}", record)?;
        count += 1;
    }
    handle.flush()?;
    info!("Dumped {} record messages from {}", count, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_path_is_the_only_required_argument() {
        let cli = Cli::try_parse_from(["fit-pace", "run.fit"]).unwrap();
        assert_eq!(cli.input, PathBuf::from("run.fit"));
        assert_eq!(cli.out_dir, PathBuf::from("."));
        assert!(!cli.dump && !cli.no_map);
        assert_eq!(build_params(&cli).unwrap(), Params::default());

        assert!(Cli::try_parse_from(["fit-pace"]).is_err());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "fit-pace",
            "run.fit",
            "--window",
            "5",
            "--interval",
            "fixed",
            "--fixed-seconds",
            "2",
        ])
        .unwrap();
        let params = build_params(&cli).unwrap();
        assert_eq!(params.window, 5);
        assert_eq!(params.interval, IntervalPolicy::Fixed(2.0));

        let cli = Cli::try_parse_from(["fit-pace", "run.fit", "--window", "0"]).unwrap();
        assert!(build_params(&cli).is_err());
    }

    #[test]
    fn config_file_is_overridden_by_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        fs::write(&path, r#"{"window": 30, "interval": {"fixed": 1.0}}"#).unwrap();
        let config = path.to_str().unwrap();

        let cli = Cli::try_parse_from(["fit-pace", "run.fit", "--config", config]).unwrap();
        let params = build_params(&cli).unwrap();
        assert_eq!(params.window, 30);
        assert_eq!(params.interval, IntervalPolicy::Fixed(1.0));

        let cli = Cli::try_parse_from([
            "fit-pace", "run.fit", "--config", config, "--interval", "elapsed",
        ])
        .unwrap();
        assert_eq!(build_params(&cli).unwrap().interval, IntervalPolicy::Elapsed);
    }

    #[test]
    fn gpx_run_writes_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("run.gpx");
        let mut gpx = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1"><trk><trkseg>"#,
        );
        for i in 0..30 {
            gpx.push_str(&format!(
                r#"<trkpt lat="{:.5}" lon="4.00000"><time>2024-05-01T08:00:{:02}Z</time></trkpt>"#,
                52.0 + i as f64 * 0.00003,
                i
            ));
        }
        gpx.push_str("</trkseg></trk></gpx>");
        fs::write(&input, gpx).unwrap();

        let out_dir = dir.path().join("out");
        let cli = Cli::try_parse_from([
            "fit-pace",
            input.to_str().unwrap(),
            "--out-dir",
            out_dir.to_str().unwrap(),
        ])
        .unwrap();
        handle_pace(&cli).unwrap();

        assert!(out_dir.join(CHART_FILE).exists());
        assert!(out_dir.join(MAP_FILE).exists());
        let csv = fs::read_to_string(out_dir.join(CSV_FILE)).unwrap();
        assert_eq!(csv.lines().count(), 31);
    }

    #[test]
    fn unreadable_input_is_reported() {
        let cli = Cli::try_parse_from(["fit-pace", "/nonexistent/run.fit"]).unwrap();
        let err = handle_pace(&cli).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to read"));
    }
}
