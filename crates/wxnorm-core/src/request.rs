//! Units requested from the data source
//!
//! The realtime endpoint is asked for temperature in the caller's unit and
//! everything else in canonical units; history is always canonical. A leaf
//! without a recognizable unit tag is assumed to be in the requested unit.

use serde::Serialize;

use crate::types::UnitPreferences;
use crate::units::{LengthUnit, PressureUnit, TemperatureUnit, WindUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceUnits {
    pub temperature: TemperatureUnit,
    pub pressure: PressureUnit,
    pub wind: WindUnit,
    pub rainfall: LengthUnit,
}

impl SourceUnits {
    pub fn canonical() -> Self {
        Self {
            temperature: TemperatureUnit::Celsius,
            pressure: PressureUnit::Hpa,
            wind: WindUnit::Ms,
            rainfall: LengthUnit::Millimeters,
        }
    }

    pub fn realtime(prefs: &UnitPreferences) -> Self {
        Self {
            temperature: prefs.temperature_unit,
            ..Self::canonical()
        }
    }
}

/// Provider unit ids, sent as query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RequestUnits {
    pub temp_unitid: u8,
    pub pressure_unitid: u8,
    pub wind_speed_unitid: u8,
    pub rainfall_unitid: u8,
    pub solar_irradiance_unitid: u8,
}

// W/m²
const SOLAR_WM2: u8 = 16;

impl From<SourceUnits> for RequestUnits {
    fn from(units: SourceUnits) -> Self {
        Self {
            temp_unitid: match units.temperature {
                TemperatureUnit::Celsius => 1,
                TemperatureUnit::Fahrenheit => 2,
            },
            pressure_unitid: match units.pressure {
                PressureUnit::Hpa => 3,
                PressureUnit::Inhg => 4,
                PressureUnit::Mmhg => 5,
            },
            wind_speed_unitid: match units.wind {
                WindUnit::Ms => 6,
                WindUnit::Kmh => 7,
                WindUnit::Knots => 8,
                WindUnit::Mph => 9,
            },
            rainfall_unitid: match units.rainfall {
                LengthUnit::Millimeters => 12,
                LengthUnit::Inches => 13,
            },
            solar_irradiance_unitid: SOLAR_WM2,
        }
    }
}

impl RequestUnits {
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("temp_unitid", self.temp_unitid.to_string()),
            ("pressure_unitid", self.pressure_unitid.to_string()),
            ("wind_speed_unitid", self.wind_speed_unitid.to_string()),
            ("rainfall_unitid", self.rainfall_unitid.to_string()),
            (
                "solar_irradiance_unitid",
                self.solar_irradiance_unitid.to_string(),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_realtime_keeps_caller_temperature() {
        let prefs = UnitPreferences::default();
        let units = SourceUnits::realtime(&prefs);
        assert_eq!(units.temperature, TemperatureUnit::Fahrenheit);
        assert_eq!(units.pressure, PressureUnit::Hpa);
        assert_eq!(units.wind, WindUnit::Ms);
        assert_eq!(units.rainfall, LengthUnit::Millimeters);
    }

    #[test]
    fn test_request_unit_ids() {
        let req = RequestUnits::from(SourceUnits::realtime(&UnitPreferences::default()));
        assert_eq!(req.temp_unitid, 2);
        assert_eq!(req.pressure_unitid, 3);
        assert_eq!(req.wind_speed_unitid, 6);
        assert_eq!(req.rainfall_unitid, 12);

        let params = RequestUnits::from(SourceUnits::canonical()).query_params();
        assert!(params.contains(&("temp_unitid", "1".to_string())));
        assert!(params.contains(&("solar_irradiance_unitid", "16".to_string())));
    }
}
