//! Core data types for normalized weather readings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::units::{LengthUnit, PressureUnit, TemperatureUnit, Unit, WindUnit};

/// Timestamp type (Unix epoch seconds)
pub type Timestamp = i64;

/// Caller-chosen output units. Passed explicitly to every transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnitPreferences {
    pub temperature_unit: TemperatureUnit,
    pub wind_unit: WindUnit,
    pub pressure_unit: PressureUnit,
    pub rainfall_unit: LengthUnit,
}

impl UnitPreferences {
    /// Celsius, m/s, hPa, mm.
    pub fn canonical() -> Self {
        Self {
            temperature_unit: TemperatureUnit::Celsius,
            wind_unit: WindUnit::Ms,
            pressure_unit: PressureUnit::Hpa,
            rainfall_unit: LengthUnit::Millimeters,
        }
    }
}

/// One normalized station reading, in the caller's units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedReading {
    pub station_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_name: Option<String>,

    pub timestamp: DateTime<Utc>,

    pub temperature: f64,

    /// Relative humidity, always within `[0, 100]`
    pub humidity: f64,

    pub pressure: f64,

    pub wind_speed: f64,

    /// Degrees, `[0, 360]`
    pub wind_direction: f64,

    pub wind_gust: f64,

    /// Daily accumulation
    pub rainfall: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rainfall_weekly: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rainfall_monthly: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rainfall_yearly: Option<f64>,

    /// W/m²
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solar_radiation: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub uv_index: Option<f64>,

    pub dew_point: f64,

    pub feels_like: f64,

    /// Mean of the battery percentages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<f64>,

    /// The upstream source never reports this; kept for consumers that read it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_strength: Option<f64>,
}

impl NormalizedReading {
    /// Value of a chartable metric.
    pub fn metric_value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Temperature => self.temperature,
            Metric::Humidity => self.humidity,
            Metric::Pressure => self.pressure,
            Metric::WindSpeed => self.wind_speed,
            Metric::Rainfall => self.rainfall,
        }
    }
}

/// Metrics that carry a history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Temperature,
    Humidity,
    Pressure,
    WindSpeed,
    Rainfall,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Temperature,
        Metric::Humidity,
        Metric::Pressure,
        Metric::WindSpeed,
        Metric::Rainfall,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::Pressure => "pressure",
            Metric::WindSpeed => "windSpeed",
            Metric::Rainfall => "rainfall",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Metric::Temperature => "Temperature",
            Metric::Humidity => "Humidity",
            Metric::Pressure => "Pressure",
            Metric::WindSpeed => "Wind Speed",
            Metric::Rainfall => "Rainfall",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown metric: {0}")]
pub struct UnknownMetric(pub String);

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "temperature" | "temp" => Ok(Metric::Temperature),
            "humidity" => Ok(Metric::Humidity),
            "pressure" => Ok(Metric::Pressure),
            "windspeed" | "wind_speed" | "wind" => Ok(Metric::WindSpeed),
            "rainfall" | "rain" => Ok(Metric::Rainfall),
            _ => Err(UnknownMetric(s.to_string())),
        }
    }
}

/// Unit label for a metric under the given preferences.
pub fn display_unit(metric: Metric, prefs: &UnitPreferences) -> &'static str {
    match metric {
        Metric::Temperature => prefs.temperature_unit.symbol(),
        Metric::Humidity => "%",
        Metric::Pressure => prefs.pressure_unit.symbol(),
        Metric::WindSpeed => prefs.wind_unit.symbol(),
        Metric::Rainfall => prefs.rainfall_unit.symbol(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Points for one metric, ascending by timestamp with no duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSeries {
    pub metric: Metric,
    pub points: Vec<HistoricalPoint>,
}

impl HistoricalSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
