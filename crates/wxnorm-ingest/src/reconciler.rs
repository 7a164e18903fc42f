//! Historical series reconciliation
//!
//! A history payload holds one `timestamp -> value` map per metric, nested at
//! paths that vary between responses. Each metric has an ordered list of
//! candidate paths; the first that yields a non-empty map wins.

use std::collections::{BTreeMap, BTreeSet};

use chrono::DateTime;
use serde_json::{Map, Value};
use tracing::warn;
use wxnorm_core::{
    clamp_humidity, convert, finite_or, lookup, parse_number, FieldPath, HistoricalPoint, HistoricalSeries,
    LengthUnit, Metric, PressureUnit, RawHistoricalPayload, SourceUnits, TemperatureUnit,
    Timestamp, Unit, UnitPreferences, WindUnit,
};

use crate::{IngestError, IngestResult};

const TEMPERATURE_PATHS: &[FieldPath] = &[
    &["outdoor", "temperature", "list"],
    &["temperature", "list"],
    &["temperature"],
];
const HUMIDITY_PATHS: &[FieldPath] = &[
    &["outdoor", "humidity", "list"],
    &["humidity", "list"],
    &["humidity"],
];
const PRESSURE_PATHS: &[FieldPath] = &[
    &["pressure", "absolute", "list"],
    &["outdoor", "pressure", "absolute", "list"],
    &["pressure", "relative", "list"],
    &["outdoor", "pressure", "relative", "list"],
    &["pressure", "list"],
];
const WIND_SPEED_PATHS: &[FieldPath] = &[
    &["wind", "wind_speed", "list"],
    &["outdoor", "wind", "wind_speed", "list"],
    &["wind_speed", "list"],
    &["windSpeed", "list"],
];
const RAINFALL_PATHS: &[FieldPath] = &[
    &["rainfall", "daily", "list"],
    &["rainfall_piezo", "daily", "list"],
    &["rainfall", "list"],
];

/// Candidate paths for a metric's value map, in probe order.
pub fn metric_paths(metric: Metric) -> &'static [FieldPath] {
    match metric {
        Metric::Temperature => TEMPERATURE_PATHS,
        Metric::Humidity => HUMIDITY_PATHS,
        Metric::Pressure => PRESSURE_PATHS,
        Metric::WindSpeed => WIND_SPEED_PATHS,
        Metric::Rainfall => RAINFALL_PATHS,
    }
}

/// One metric's values, keyed by parsed timestamp.
#[derive(Debug)]
struct MetricSource<'a> {
    metric: Metric,
    unit_tag: Option<&'a str>,
    values: BTreeMap<Timestamp, f64>,
}

impl<'a> MetricSource<'a> {
    fn probe(body: &'a Value, metric: Metric) -> Self {
        let found = metric_paths(metric).iter().find_map(|path| {
            lookup(body, path)
                .and_then(Value::as_object)
                .filter(|map| !map.is_empty())
                .map(|map| (*path, map))
        });

        match found {
            Some((path, map)) => Self {
                metric,
                unit_tag: sibling_unit(body, path),
                values: parse_values(map),
            },
            None => Self {
                metric,
                unit_tag: None,
                values: BTreeMap::new(),
            },
        }
    }

    fn point(&self, ts: Timestamp, prefs: &UnitPreferences) -> Option<HistoricalPoint> {
        let raw = self.values.get(&ts).copied().unwrap_or(0.0);
        DateTime::from_timestamp(ts, 0).map(|timestamp| HistoricalPoint {
            timestamp,
            value: to_caller_units(self.metric, raw, self.unit_tag, prefs),
        })
    }
}

/// The `unit` next to a `list` map, e.g. `outdoor.temperature.unit`.
fn sibling_unit<'a>(body: &'a Value, path: &[&str]) -> Option<&'a str> {
    match path.split_last() {
        Some((&"list", parent)) => lookup(body, parent)
            .and_then(|node| node.get("unit"))
            .and_then(Value::as_str),
        _ => None,
    }
}

/// Parse keys as Unix seconds. Unparseable keys are dropped; when two keys
/// parse to the same instant the first in key order is kept. Malformed
/// values read as 0.
fn parse_values(map: &Map<String, Value>) -> BTreeMap<Timestamp, f64> {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut values = BTreeMap::new();
    for (key, value) in entries {
        if let Ok(ts) = key.trim().parse::<Timestamp>() {
            values
                .entry(ts)
                .or_insert_with(|| parse_number(value).unwrap_or(0.0));
        }
    }
    values
}

fn to_caller_units(metric: Metric, value: f64, tag: Option<&str>, prefs: &UnitPreferences) -> f64 {
    let source = SourceUnits::canonical();
    let converted = match metric {
        Metric::Temperature => {
            tagged::<TemperatureUnit>(value, tag, source.temperature, prefs.temperature_unit)
        }
        Metric::Humidity => clamp_humidity(value),
        Metric::Pressure => tagged::<PressureUnit>(value, tag, source.pressure, prefs.pressure_unit),
        Metric::WindSpeed => tagged::<WindUnit>(value, tag, source.wind, prefs.wind_unit),
        Metric::Rainfall => tagged::<LengthUnit>(value, tag, source.rainfall, prefs.rainfall_unit),
    };
    finite_or(converted, 0.0)
}

fn tagged<U: Unit>(value: f64, tag: Option<&str>, assumed: U, target: U) -> f64 {
    let from = tag.and_then(U::from_source_tag).unwrap_or(assumed);
    convert(value, from, target)
}

/// Reconcile the requested metrics into timestamp-aligned series.
///
/// Never fails: a structurally unusable payload yields no series.
pub fn reconcile(
    raw: &RawHistoricalPayload,
    prefs: &UnitPreferences,
    metrics: &[Metric],
) -> Vec<HistoricalSeries> {
    match try_reconcile(raw, prefs, metrics) {
        Ok(series) => series,
        Err(e) => {
            warn!(error = %e, "history payload unusable, returning no series");
            Vec::new()
        }
    }
}

/// Points for a single metric; empty when the payload has none.
pub fn reconcile_metric(
    raw: &RawHistoricalPayload,
    prefs: &UnitPreferences,
    metric: Metric,
) -> Vec<HistoricalPoint> {
    reconcile(raw, prefs, &[metric])
        .into_iter()
        .next()
        .map(|series| series.points)
        .unwrap_or_default()
}

/// As [`reconcile`], reporting why a payload was rejected.
///
/// Every returned series carries the union of all requested metrics'
/// timestamps, ascending, with 0 (before unit conversion) where a metric has
/// no entry.
pub fn try_reconcile(
    raw: &RawHistoricalPayload,
    prefs: &UnitPreferences,
    metrics: &[Metric],
) -> IngestResult<Vec<HistoricalSeries>> {
    let envelope = raw.envelope();
    if !envelope.is_success() {
        return Err(IngestError::Provider {
            code: envelope.code.unwrap_or_default(),
            message: envelope.message.unwrap_or_default(),
        });
    }

    let body = raw.body();
    if !body.is_object() {
        return Err(IngestError::Structural(
            "history body is not an object".to_string(),
        ));
    }

    let mut requested: Vec<Metric> = Vec::with_capacity(metrics.len());
    for metric in metrics {
        if !requested.contains(metric) {
            requested.push(*metric);
        }
    }

    let sources: Vec<MetricSource<'_>> = requested
        .iter()
        .map(|metric| MetricSource::probe(body, *metric))
        .collect();

    let timestamps: BTreeSet<Timestamp> = sources
        .iter()
        .flat_map(|source| source.values.keys().copied())
        .collect();

    Ok(sources
        .iter()
        .map(|source| HistoricalSeries {
            metric: source.metric,
            points: timestamps
                .iter()
                .filter_map(|ts| source.point(*ts, prefs))
                .collect(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn canonical() -> UnitPreferences {
        UnitPreferences::canonical()
    }

    fn stamps(series: &HistoricalSeries) -> Vec<i64> {
        series.points.iter().map(|p| p.timestamp.timestamp()).collect()
    }

    fn values(series: &HistoricalSeries) -> Vec<f64> {
        series.points.iter().map(|p| p.value).collect()
    }

    #[test]
    fn test_union_of_timestamps_with_zero_default() {
        let raw = RawHistoricalPayload::new(json!({
            "outdoor": {
                "temperature": {"unit": "℃", "list": {"100": "10.5", "200": "11"}},
                "humidity": {"unit": "%", "list": {"300": "70", "200": "65"}}
            }
        }));
        let series = reconcile(&raw, &canonical(), &[Metric::Temperature, Metric::Humidity]);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].metric, Metric::Temperature);
        assert_eq!(stamps(&series[0]), vec![100, 200, 300]);
        assert_eq!(values(&series[0]), vec![10.5, 11.0, 0.0]);
        assert_eq!(stamps(&series[1]), vec![100, 200, 300]);
        assert_eq!(values(&series[1]), vec![0.0, 65.0, 70.0]);
    }

    #[test]
    fn test_values_converted_to_caller_units() {
        let raw = RawHistoricalPayload::new(json!({
            "code": 0,
            "msg": "success",
            "data": {
                "outdoor": {"temperature": {"list": {"1700000000": "20"}}},
                "pressure": {"relative": {"unit": "hPa", "list": {"1700000000": "1000"}}},
                "wind": {"wind_speed": {"unit": "km/h", "list": {"1700000000": "36"}}}
            }
        }));
        let prefs = UnitPreferences::default();
        let series = reconcile(
            &raw,
            &prefs,
            &[Metric::Temperature, Metric::Pressure, Metric::WindSpeed],
        );

        assert!((series[0].points[0].value - 68.0).abs() < 1e-9);
        assert!((series[1].points[0].value - 29.53).abs() < 1e-9);
        assert!((series[2].points[0].value - 22.37).abs() < 1e-9);
    }

    #[test]
    fn test_candidate_paths_probed_in_order() {
        let raw = RawHistoricalPayload::new(json!({
            "pressure": {
                "absolute": {"list": {}},
                "relative": {"list": {"50": "1014"}}
            },
            "rainfall_piezo": {"daily": {"list": {"50": "1.5"}}}
        }));
        let series = reconcile(&raw, &canonical(), &[Metric::Pressure, Metric::Rainfall]);
        assert_eq!(values(&series[0]), vec![1014.0]);
        assert_eq!(values(&series[1]), vec![1.5]);
    }

    #[test]
    fn test_absolute_pressure_preferred_like_realtime() {
        let raw = RawHistoricalPayload::new(json!({
            "pressure": {
                "relative": {"list": {"50": "1014"}},
                "absolute": {"list": {"50": "995.9"}}
            }
        }));
        let series = reconcile(&raw, &canonical(), &[Metric::Pressure]);
        assert_eq!(values(&series[0]), vec![995.9]);
    }

    #[test]
    fn test_overflowing_values_read_as_zero() {
        let raw = RawHistoricalPayload::new(json!({
            "outdoor": {"temperature": {"unit": "℃", "list": {"100": "1e308", "200": "21"}}}
        }));
        let series = reconcile(&raw, &UnitPreferences::default(), &[Metric::Temperature]);
        let temps = values(&series[0]);
        assert_eq!(temps[0], 0.0);
        assert!((temps[1] - 69.8).abs() < 1e-9);
    }

    #[test]
    fn test_bad_timestamps_and_values() {
        let raw = RawHistoricalPayload::new(json!({
            "humidity": {"list": {"abc": "40", "20": "oops", "10": "120", "010": "30"}}
        }));
        let series = reconcile(&raw, &canonical(), &[Metric::Humidity]);
        assert_eq!(stamps(&series[0]), vec![10, 20]);
        // "010" sorts before "10" and wins; "oops" reads as 0
        assert_eq!(values(&series[0]), vec![30.0, 0.0]);
    }

    #[test]
    fn test_humidity_clamped() {
        let raw = RawHistoricalPayload::new(json!({"humidity": {"list": {"10": "120"}}}));
        assert_eq!(
            reconcile_metric(&raw, &canonical(), Metric::Humidity)[0].value,
            100.0
        );
    }

    #[test]
    fn test_structural_failures_are_soft() {
        let raw = RawHistoricalPayload::new(json!([1, 2, 3]));
        assert!(reconcile(&raw, &canonical(), &[Metric::Temperature]).is_empty());
        assert!(matches!(
            try_reconcile(&raw, &canonical(), &[Metric::Temperature]),
            Err(IngestError::Structural(_))
        ));

        let raw = RawHistoricalPayload::new(json!({"code": -1, "msg": "rate limited", "data": []}));
        assert!(matches!(
            try_reconcile(&raw, &canonical(), &[Metric::Temperature]),
            Err(IngestError::Provider { code: -1, .. })
        ));
        assert!(reconcile_metric(&raw, &canonical(), Metric::Temperature).is_empty());
    }

    #[test]
    fn test_missing_metric_yields_empty_series() {
        let raw = RawHistoricalPayload::new(json!({"outdoor": {}}));
        let series = reconcile(&raw, &canonical(), &[Metric::WindSpeed, Metric::WindSpeed]);
        assert_eq!(series.len(), 1);
        assert!(series[0].is_empty());
    }
}
