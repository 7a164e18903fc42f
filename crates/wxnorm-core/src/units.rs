//! Unit conversion utilities
//!
//! Canonical units are Celsius, hPa, m/s and mm. `convert_*` functions take a
//! canonical value and a target unit, the `*_to_*` inverses bring a value in
//! some unit back to canonical. Nothing here rounds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const HPA_TO_INHG: f64 = 0.02953;
const HPA_TO_MMHG: f64 = 0.750062;
const MS_TO_KMH: f64 = 3.6;
const MS_TO_MPH: f64 = 2.237;
const MS_TO_KNOTS: f64 = 1.944;
const MM_TO_INCHES: f64 = 0.0393701;

/// Unit conversion error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitError {
    #[error("Unknown {kind} unit: {value}")]
    UnknownUnit { kind: &'static str, value: String },
}

/// A unit within one physical dimension.
pub trait Unit: Copy + PartialEq {
    /// Convert a canonical value into this unit.
    fn from_canonical(self, value: f64) -> f64;

    /// Convert a value in this unit back to canonical.
    fn to_canonical(self, value: f64) -> f64;

    /// Display label, e.g. `°F` or `km/h`.
    fn symbol(self) -> &'static str;

    /// Recognize the unit tag a data source attaches to a reading.
    fn from_source_tag(tag: &str) -> Option<Self>;
}

/// Convert between two units of the same dimension.
pub fn convert<U: Unit>(value: f64, from: U, to: U) -> f64 {
    if from == to {
        return value;
    }
    to.from_canonical(from.to_canonical(value))
}

/// `value` unless it is NaN or infinite, in which case `fallback`.
///
/// Large finite readings can overflow once scaled into another unit.
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    Celsius,
    #[default]
    Fahrenheit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PressureUnit {
    Hpa,
    #[default]
    Inhg,
    Mmhg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindUnit {
    Ms,
    Kmh,
    #[default]
    Mph,
    Knots,
}

/// Length unit, used for rainfall accumulations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LengthUnit {
    #[serde(rename = "mm")]
    Millimeters,
    #[default]
    #[serde(rename = "in")]
    Inches,
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

pub fn convert_temperature(celsius: f64, unit: TemperatureUnit) -> f64 {
    unit.from_canonical(celsius)
}

pub fn temperature_to_celsius(value: f64, unit: TemperatureUnit) -> f64 {
    unit.to_canonical(value)
}

pub fn convert_pressure(hpa: f64, unit: PressureUnit) -> f64 {
    unit.from_canonical(hpa)
}

pub fn pressure_to_hpa(value: f64, unit: PressureUnit) -> f64 {
    unit.to_canonical(value)
}

pub fn convert_wind_speed(ms: f64, unit: WindUnit) -> f64 {
    unit.from_canonical(ms)
}

pub fn wind_speed_to_ms(value: f64, unit: WindUnit) -> f64 {
    unit.to_canonical(value)
}

pub fn convert_length(mm: f64, unit: LengthUnit) -> f64 {
    unit.from_canonical(mm)
}

pub fn length_to_mm(value: f64, unit: LengthUnit) -> f64 {
    unit.to_canonical(value)
}

impl Unit for TemperatureUnit {
    fn from_canonical(self, value: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => value,
            TemperatureUnit::Fahrenheit => celsius_to_fahrenheit(value),
        }
    }

    fn to_canonical(self, value: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => value,
            TemperatureUnit::Fahrenheit => fahrenheit_to_celsius(value),
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    fn from_source_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "℃" | "°c" | "c" | "celsius" => Some(TemperatureUnit::Celsius),
            "℉" | "°f" | "f" | "fahrenheit" => Some(TemperatureUnit::Fahrenheit),
            _ => None,
        }
    }
}

impl Unit for PressureUnit {
    fn from_canonical(self, value: f64) -> f64 {
        match self {
            PressureUnit::Hpa => value,
            PressureUnit::Inhg => value * HPA_TO_INHG,
            PressureUnit::Mmhg => value * HPA_TO_MMHG,
        }
    }

    fn to_canonical(self, value: f64) -> f64 {
        match self {
            PressureUnit::Hpa => value,
            PressureUnit::Inhg => value / HPA_TO_INHG,
            PressureUnit::Mmhg => value / HPA_TO_MMHG,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            PressureUnit::Hpa => "hPa",
            PressureUnit::Inhg => "inHg",
            PressureUnit::Mmhg => "mmHg",
        }
    }

    fn from_source_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "hpa" | "mbar" | "mb" => Some(PressureUnit::Hpa),
            "inhg" => Some(PressureUnit::Inhg),
            "mmhg" => Some(PressureUnit::Mmhg),
            _ => None,
        }
    }
}

impl Unit for WindUnit {
    fn from_canonical(self, value: f64) -> f64 {
        match self {
            WindUnit::Ms => value,
            WindUnit::Kmh => value * MS_TO_KMH,
            WindUnit::Mph => value * MS_TO_MPH,
            WindUnit::Knots => value * MS_TO_KNOTS,
        }
    }

    fn to_canonical(self, value: f64) -> f64 {
        match self {
            WindUnit::Ms => value,
            WindUnit::Kmh => value / MS_TO_KMH,
            WindUnit::Mph => value / MS_TO_MPH,
            WindUnit::Knots => value / MS_TO_KNOTS,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            WindUnit::Ms => "m/s",
            WindUnit::Kmh => "km/h",
            WindUnit::Mph => "mph",
            WindUnit::Knots => "knots",
        }
    }

    fn from_source_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "m/s" | "ms" | "mps" => Some(WindUnit::Ms),
            "km/h" | "kmh" | "kph" => Some(WindUnit::Kmh),
            "mph" => Some(WindUnit::Mph),
            "knots" | "knot" | "kn" | "kt" | "kts" => Some(WindUnit::Knots),
            _ => None,
        }
    }
}

impl Unit for LengthUnit {
    fn from_canonical(self, value: f64) -> f64 {
        match self {
            LengthUnit::Millimeters => value,
            LengthUnit::Inches => value * MM_TO_INCHES,
        }
    }

    fn to_canonical(self, value: f64) -> f64 {
        match self {
            LengthUnit::Millimeters => value,
            LengthUnit::Inches => value / MM_TO_INCHES,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            LengthUnit::Millimeters => "mm",
            LengthUnit::Inches => "in",
        }
    }

    fn from_source_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "mm" | "mm/hr" | "mm/h" => Some(LengthUnit::Millimeters),
            "in" | "inch" | "inches" | "in/hr" => Some(LengthUnit::Inches),
            _ => None,
        }
    }
}

macro_rules! unit_from_str {
    ($ty:ty, $kind:literal) => {
        impl FromStr for $ty {
            type Err = UnitError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty as Unit>::from_source_tag(s).ok_or_else(|| UnitError::UnknownUnit {
                    kind: $kind,
                    value: s.to_string(),
                })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.symbol())
            }
        }
    };
}

unit_from_str!(TemperatureUnit, "temperature");
unit_from_str!(PressureUnit, "pressure");
unit_from_str!(WindUnit, "wind speed");
unit_from_str!(LengthUnit, "length");
