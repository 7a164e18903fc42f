use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{info, warn};
use wxnorm_config::AppConfig;
use wxnorm_core::{
    HistoricalSeries, LengthUnit, Metric, NormalizedReading, PressureUnit, RawHistoricalPayload,
    RawStationPayload, TemperatureUnit, TimeRange, UnitPreferences, WindUnit,
};
use wxnorm_ingest::{
    condense_forecast, generate_synthetic, normalize, parse_periods, reconcile, HistoryOptions,
};

const UNKNOWN_STATION: &str = "unknown";

#[derive(Debug, Parser)]
#[command(name = "wxnorm", version, about = "Normalize weather station telemetry")]
pub struct Cli {
    /// TOML configuration file (defaults to wxnorm.toml)
    #[arg(long, env = "WXNORM_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log filter directive, e.g. 'warn' or 'info,wxnorm=debug'
    #[arg(long, env = "RUST_LOG", default_value = "warn", global = true)]
    pub log_level: String,

    /// Read the payload from this file instead of stdin
    #[arg(long, global = true)]
    pub input: Option<PathBuf>,

    /// Output temperature unit: celsius or fahrenheit
    #[arg(long, global = true)]
    pub temperature_unit: Option<TemperatureUnit>,

    /// Output wind unit: ms, kmh, mph or knots
    #[arg(long, global = true)]
    pub wind_unit: Option<WindUnit>,

    /// Output pressure unit: hpa, inhg or mmhg
    #[arg(long, global = true)]
    pub pressure_unit: Option<PressureUnit>,

    /// Output rainfall unit: mm or in
    #[arg(long, global = true)]
    pub rainfall_unit: Option<LengthUnit>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Normalize a realtime station payload
    Normalize {
        #[arg(long)]
        station_id: Option<String>,
    },
    /// Reconcile a history payload into per-metric series
    History {
        /// Metric to extract; repeat for several (all when omitted)
        #[arg(long = "metric")]
        metrics: Vec<Metric>,
        /// Realtime payload used to synthesize metrics the history lacks
        #[arg(long)]
        current: Option<PathBuf>,
    },
    /// Generate a synthetic 24-hour series from a realtime payload
    Synthesize {
        #[arg(long)]
        station_id: Option<String>,
        #[arg(long)]
        metric: Metric,
    },
    /// Condense a National Weather Service forecast into daily summaries
    Forecast,
}

impl Cli {
    /// Config file preferences with command-line overrides applied.
    pub fn unit_preferences(&self, config: &AppConfig) -> UnitPreferences {
        let base = config.unit_preferences();
        UnitPreferences {
            temperature_unit: self.temperature_unit.unwrap_or(base.temperature_unit),
            wind_unit: self.wind_unit.unwrap_or(base.wind_unit),
            pressure_unit: self.pressure_unit.unwrap_or(base.pressure_unit),
            rainfall_unit: self.rainfall_unit.unwrap_or(base.rainfall_unit),
        }
    }

    pub fn load_config(&self) -> Result<AppConfig> {
        let cfg = match &self.config {
            Some(path) => AppConfig::load_from(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => AppConfig::load().context("failed to load config")?,
        };
        Ok(cfg)
    }
}

/// History window and fallback from the `[history]` config section.
pub fn history_options(config: &AppConfig) -> HistoryOptions {
    HistoryOptions {
        window_hours: config.history_window_hours(),
        synthetic_fallback: config.synthetic_fallback(),
    }
}

/// Read the payload from `path`, or stdin when none is given.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

/// Run one command against an input document and return its JSON output.
pub fn run(cli: &Cli, input: &str) -> Result<Value> {
    let config = cli.load_config()?;
    let prefs = cli.unit_preferences(&config);

    let output = match &cli.command {
        Command::Normalize { station_id } => {
            let station = station_id
                .as_deref()
                .or(config.station_id())
                .unwrap_or(UNKNOWN_STATION);
            let mut reading = normalize(&station_payload(input)?, station, &prefs);
            if reading.station_name.is_none() {
                reading.station_name = config.station_name().map(str::to_string);
            }
            info!(station, "normalized reading");
            serde_json::to_value(reading)?
        }
        Command::History { metrics, current } => {
            let metrics: Vec<Metric> = if metrics.is_empty() {
                Metric::ALL.to_vec()
            } else {
                metrics.clone()
            };
            let options = history_options(&config);
            let raw = RawHistoricalPayload::from_json(input)
                .context("history payload is not valid JSON")?;
            let mut series = reconcile(&raw, &prefs, &metrics);
            trim_to_window(&mut series, options.window_hours);

            if let Some(path) = current.as_deref().filter(|_| options.synthetic_fallback) {
                let station = config.station_id().unwrap_or(UNKNOWN_STATION);
                let raw_current = station_payload(&read_input(Some(path))?)?;
                let reading = normalize(&raw_current, station, &prefs);
                fill_synthetic(&mut series, &metrics, &reading, &prefs);
            }

            info!(series = series.len(), "reconciled history");
            serde_json::to_value(series)?
        }
        Command::Synthesize { station_id, metric } => {
            let station = station_id
                .as_deref()
                .or(config.station_id())
                .unwrap_or(UNKNOWN_STATION);
            let current = normalize(&station_payload(input)?, station, &prefs);
            let series = HistoricalSeries {
                metric: *metric,
                points: generate_synthetic(&current, *metric, &prefs),
            };
            serde_json::to_value(series)?
        }
        Command::Forecast => {
            let doc: Value =
                serde_json::from_str(input).context("forecast document is not valid JSON")?;
            let periods = parse_periods(&doc)?;
            let today = chrono::Local::now().date_naive();
            serde_json::to_value(condense_forecast(&periods, today))?
        }
    };

    Ok(output)
}

/// Drop points older than `hours` before the newest point of any series.
fn trim_to_window(series: &mut [HistoricalSeries], hours: u32) {
    let newest = series
        .iter()
        .filter_map(|s| s.points.last())
        .map(|p| p.timestamp)
        .max();
    let Some(newest) = newest else {
        return;
    };
    let window = TimeRange::trailing_hours(newest, hours);
    for s in series.iter_mut() {
        s.points.retain(|p| p.timestamp >= window.start);
    }
}

/// Synthesize every requested metric that has no points.
fn fill_synthetic(
    series: &mut Vec<HistoricalSeries>,
    metrics: &[Metric],
    current: &NormalizedReading,
    prefs: &UnitPreferences,
) {
    for metric in metrics {
        let points = || generate_synthetic(current, *metric, prefs);
        match series.iter_mut().find(|s| s.metric == *metric) {
            Some(s) if !s.is_empty() => {}
            Some(s) => {
                warn!(%metric, "no usable history, generating synthetic series");
                s.points = points();
            }
            None => {
                warn!(%metric, "no usable history, generating synthetic series");
                series.push(HistoricalSeries {
                    metric: *metric,
                    points: points(),
                });
            }
        }
    }
}

fn station_payload(input: &str) -> Result<RawStationPayload> {
    let raw = RawStationPayload::from_json(input).context("station payload is not valid JSON")?;
    let envelope = raw.envelope();
    if !envelope.is_success() {
        warn!(
            code = envelope.code,
            message = envelope.message.as_deref().unwrap_or_default(),
            "payload carries a provider error"
        );
    }
    Ok(raw)
}
