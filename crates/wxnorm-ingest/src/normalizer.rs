//! Realtime payload normalization
//!
//! Turns a [`RawStationPayload`] into a [`NormalizedReading`] in the caller's
//! units. Missing or malformed sensors degrade to defaults; this never fails.

use chrono::{DateTime, Utc};
use serde_json::Value;
use wxnorm_core::{
    clamp_humidity, clamp_humidity_for_derivation, convert, convert_temperature, dew_point,
    feels_like, finite_or, leaf_at, lookup, parse_number, text_at, ApparentModel, FieldPath,
    LengthUnit, NormalizedReading, PressureUnit, RawStationPayload, SourceUnits, TemperatureUnit,
    Unit, UnitPreferences, WindUnit,
};

const STATION_NAME: &[FieldPath] = &[
    &["device_name"],
    &["station_name"],
    &["name"],
    &["device", "name"],
    &["station", "name"],
];

const TEMPERATURE: &[FieldPath] = &[&["outdoor", "temperature"]];
const HUMIDITY: &[FieldPath] = &[&["outdoor", "humidity"]];
const PRESSURE: &[FieldPath] = &[
    &["pressure", "absolute"],
    &["outdoor", "pressure", "absolute"],
    &["pressure", "relative"],
    &["outdoor", "pressure", "relative"],
];
const WIND_SPEED: &[FieldPath] = &[&["wind", "wind_speed"], &["outdoor", "wind", "wind_speed"]];
const WIND_GUST: &[FieldPath] = &[&["wind", "wind_gust"], &["outdoor", "wind", "wind_gust"]];
const WIND_DIRECTION: &[FieldPath] = &[
    &["wind", "wind_direction"],
    &["outdoor", "wind", "wind_direction"],
];
const RAIN_DAILY: &[FieldPath] = &[&["rainfall", "daily"], &["rainfall_piezo", "daily"]];
const RAIN_WEEKLY: &[FieldPath] = &[&["rainfall", "weekly"], &["rainfall_piezo", "weekly"]];
const RAIN_MONTHLY: &[FieldPath] = &[&["rainfall", "monthly"], &["rainfall_piezo", "monthly"]];
const RAIN_YEARLY: &[FieldPath] = &[&["rainfall", "yearly"], &["rainfall_piezo", "yearly"]];
const SOLAR: &[FieldPath] = &[&["solar_and_uvi", "solar"]];
const UVI: &[FieldPath] = &[&["solar_and_uvi", "uvi"]];

/// Normalize a realtime payload, stamped with the envelope time or now.
pub fn normalize(
    raw: &RawStationPayload,
    station_id: &str,
    prefs: &UnitPreferences,
) -> NormalizedReading {
    normalize_at(raw, station_id, prefs, Utc::now())
}

/// As [`normalize`], with `now` used when the payload carries no time.
pub fn normalize_at(
    raw: &RawStationPayload,
    station_id: &str,
    prefs: &UnitPreferences,
    now: DateTime<Utc>,
) -> NormalizedReading {
    let body = raw.body();
    let source = SourceUnits::realtime(prefs);

    let (temp_raw, temp_unit) = reading(body, TEMPERATURE, source.temperature);
    let (temperature, temp_c) = match (
        convert(temp_raw, temp_unit, prefs.temperature_unit),
        temp_unit.to_canonical(temp_raw),
    ) {
        (t, c) if t.is_finite() && c.is_finite() => (t, c),
        _ => (0.0, prefs.temperature_unit.to_canonical(0.0)),
    };

    let humidity = clamp_humidity(leaf_value(body, HUMIDITY).unwrap_or(0.0));

    let pressure = converted(
        reading::<PressureUnit>(body, PRESSURE, source.pressure),
        prefs.pressure_unit,
    );
    let (wind_raw, wind_unit) = reading::<WindUnit>(body, WIND_SPEED, source.wind);
    let wind_speed = converted((wind_raw, wind_unit), prefs.wind_unit);
    let wind_gust = converted(
        reading::<WindUnit>(body, WIND_GUST, source.wind),
        prefs.wind_unit,
    );
    let rainfall = converted(
        reading::<LengthUnit>(body, RAIN_DAILY, source.rainfall),
        prefs.rainfall_unit,
    );
    let wind_ms = finite_or(wind_unit.to_canonical(wind_raw), 0.0);

    let rain_total = |candidates: &[FieldPath]| {
        optional_reading::<LengthUnit>(body, candidates, source.rainfall)
            .map(|(v, unit)| convert(v, unit, prefs.rainfall_unit))
            .filter(|v| v.is_finite())
    };

    let (dew_point, feels_like) =
        derived(temp_c, temperature, humidity, wind_ms, prefs.temperature_unit);

    NormalizedReading {
        station_id: station_id.to_string(),
        station_name: text_at(body, STATION_NAME).map(str::to_string),
        timestamp: raw.envelope().time.unwrap_or(now),
        temperature,
        humidity,
        pressure,
        wind_speed,
        wind_direction: wind_direction(leaf_value(body, WIND_DIRECTION).unwrap_or(0.0)),
        wind_gust,
        rainfall,
        rainfall_weekly: rain_total(RAIN_WEEKLY),
        rainfall_monthly: rain_total(RAIN_MONTHLY),
        rainfall_yearly: rain_total(RAIN_YEARLY),
        solar_radiation: leaf_value(body, SOLAR),
        uv_index: leaf_value(body, UVI),
        dew_point,
        feels_like,
        battery_level: battery_level(body),
        signal_strength: None,
    }
}

/// Dew point and apparent temperature in the caller's temperature unit.
///
/// `temperature` is the already-converted output temperature; both results
/// are kept at or below it where the physics says they must be.
fn derived(
    temp_c: f64,
    temperature: f64,
    humidity: f64,
    wind_ms: f64,
    unit: TemperatureUnit,
) -> (f64, f64) {
    let dew_c = dew_point(temp_c, clamp_humidity_for_derivation(humidity));
    let dew = finite_or(convert_temperature(dew_c, unit), temperature).min(temperature);

    let feels = match ApparentModel::select(temp_c, wind_ms) {
        ApparentModel::Ambient => temperature,
        _ => finite_or(
            convert_temperature(feels_like(temp_c, humidity, wind_ms), unit),
            temperature,
        ),
    };

    (dew, feels)
}

/// Reading in the target unit; 0 when the conversion overflows.
fn converted<U: Unit>((value, from): (f64, U), to: U) -> f64 {
    finite_or(convert(value, from, to), 0.0)
}

/// Value and resolved unit at the first present path, `(0, assumed)` if absent.
fn reading<U: Unit>(body: &Value, candidates: &[FieldPath], assumed: U) -> (f64, U) {
    optional_reading(body, candidates, assumed).unwrap_or((0.0, assumed))
}

fn optional_reading<U: Unit>(
    body: &Value,
    candidates: &[FieldPath],
    assumed: U,
) -> Option<(f64, U)> {
    let leaf = leaf_at(body, candidates)?;
    let unit = leaf.unit.and_then(U::from_source_tag).unwrap_or(assumed);
    leaf.value.map(|v| (v, unit))
}

fn leaf_value(body: &Value, candidates: &[FieldPath]) -> Option<f64> {
    leaf_at(body, candidates).and_then(|leaf| leaf.value)
}

fn wind_direction(degrees: f64) -> f64 {
    if (0.0..=360.0).contains(&degrees) {
        degrees
    } else {
        degrees.rem_euclid(360.0)
    }
}

/// Mean battery percentage; entries without a usable percentage count as 0.
fn battery_level(body: &Value) -> Option<f64> {
    let entries = lookup(body, &["battery"])?.as_array()?;
    if entries.is_empty() {
        return None;
    }
    let total: f64 = entries
        .iter()
        .map(|b| b.get("percentage").and_then(parse_number).unwrap_or(0.0))
        .sum();
    Some(total / entries.len() as f64).filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_empty_payload_defaults() {
        let raw = RawStationPayload::new(json!({}));
        let r = normalize_at(&raw, "st-1", &UnitPreferences::default(), at());

        assert_eq!(r.station_id, "st-1");
        assert_eq!(r.station_name, None);
        assert_eq!(r.timestamp, at());
        assert_eq!(r.temperature, 0.0);
        assert_eq!(r.humidity, 0.0);
        assert_eq!(r.pressure, 0.0);
        assert_eq!(r.wind_speed, 0.0);
        assert_eq!(r.wind_gust, 0.0);
        assert_eq!(r.rainfall, 0.0);
        assert_eq!(r.solar_radiation, None);
        assert_eq!(r.uv_index, None);
        assert_eq!(r.battery_level, None);
        assert_eq!(r.signal_strength, None);
        assert_eq!(r.rainfall_weekly, None);
        assert!(r.dew_point.is_finite());
        assert!(r.feels_like.is_finite());
    }

    #[test]
    fn test_celsius_tag_converted_to_fahrenheit() {
        let raw = RawStationPayload::new(json!({
            "outdoor": {
                "temperature": {"value": "20", "unit": "℃"},
                "humidity": {"value": "50", "unit": "%"}
            }
        }));
        let r = normalize_at(&raw, "st", &UnitPreferences::default(), at());

        assert!(close(r.temperature, 68.0));
        assert_eq!(r.humidity, 50.0);
        // ~9.26 °C
        assert!((r.dew_point - 48.67).abs() < 0.1);
        assert!(r.dew_point <= r.temperature);
        assert_eq!(r.feels_like, r.temperature);
    }

    #[test]
    fn test_untagged_temperature_is_in_requested_unit() {
        let raw = RawStationPayload::new(json!({
            "outdoor": {
                "temperature": {"value": "68"},
                "humidity": {"value": "50"}
            }
        }));
        let r = normalize_at(&raw, "st", &UnitPreferences::default(), at());
        assert_eq!(r.temperature, 68.0);
        assert_eq!(r.feels_like, 68.0);
        assert!(r.dew_point < 68.0);
    }

    #[test]
    fn test_fixed_source_units_are_converted() {
        let raw = RawStationPayload::new(json!({
            "pressure": {"absolute": {"value": "1000", "unit": "hPa"}},
            "wind": {
                "wind_speed": {"value": "10", "unit": "m/s"},
                "wind_gust": {"value": "20"},
                "wind_direction": {"value": "270", "unit": "º"}
            },
            "rainfall": {
                "daily": {"value": "25.4", "unit": "mm"},
                "yearly": {"value": "254"}
            }
        }));
        let r = normalize_at(&raw, "st", &UnitPreferences::default(), at());

        assert!(close(r.pressure, 29.53));
        assert!(close(r.wind_speed, 22.37));
        assert!(close(r.wind_gust, 44.74));
        assert_eq!(r.wind_direction, 270.0);
        assert!(close(r.rainfall, 25.4 * 0.0393701));
        assert!(close(r.rainfall_yearly.unwrap(), 254.0 * 0.0393701));
        assert_eq!(r.rainfall_monthly, None);
    }

    #[test]
    fn test_fallback_paths_are_probed() {
        let raw = RawStationPayload::new(json!({
            "outdoor": {
                "wind": {"wind_speed": {"value": "3"}},
                "pressure": {"relative": {"value": "1012"}}
            },
            "rainfall_piezo": {"daily": {"value": "2"}}
        }));
        let r = normalize_at(&raw, "st", &UnitPreferences::canonical(), at());
        assert_eq!(r.wind_speed, 3.0);
        assert_eq!(r.pressure, 1012.0);
        assert_eq!(r.rainfall, 2.0);
    }

    #[test]
    fn test_humidity_clamped() {
        let raw = RawStationPayload::new(json!({
            "outdoor": {"temperature": {"value": "30"}, "humidity": {"value": "130"}}
        }));
        let r = normalize_at(&raw, "st", &UnitPreferences::canonical(), at());
        assert_eq!(r.humidity, 100.0);
        assert!(r.dew_point <= r.temperature);

        let raw = RawStationPayload::new(json!({"outdoor": {"humidity": {"value": "-4"}}}));
        let r = normalize_at(&raw, "st", &UnitPreferences::canonical(), at());
        assert_eq!(r.humidity, 0.0);
        assert!(r.dew_point.is_finite());
    }

    #[test]
    fn test_malformed_values_default() {
        let raw = RawStationPayload::new(json!({
            "outdoor": {"temperature": {"value": "--"}, "humidity": {"value": "NaN"}},
            "solar_and_uvi": {"solar": {"value": "n/a"}, "uvi": {"value": "0"}}
        }));
        let r = normalize_at(&raw, "st", &UnitPreferences::canonical(), at());
        assert_eq!(r.temperature, 0.0);
        assert_eq!(r.humidity, 0.0);
        assert_eq!(r.solar_radiation, None);
        assert_eq!(r.uv_index, Some(0.0));
    }

    #[test]
    fn test_wind_chill_in_caller_units() {
        let raw = RawStationPayload::new(json!({
            "outdoor": {"temperature": {"value": "0"}, "humidity": {"value": "60"}},
            "wind": {"wind_speed": {"value": "5"}}
        }));
        let prefs = UnitPreferences {
            temperature_unit: TemperatureUnit::Celsius,
            ..UnitPreferences::default()
        };
        let r = normalize_at(&raw, "st", &prefs, at());
        assert!(r.feels_like < 0.0);
        assert!(close(r.wind_speed, 5.0 * 2.237));
    }

    #[test]
    fn test_battery_average() {
        let raw = RawStationPayload::new(json!({
            "battery": [
                {"id": "1", "percentage": "80"},
                {"id": "2", "percentage": "60"},
                {"id": "3"}
            ]
        }));
        let r = normalize_at(&raw, "st", &UnitPreferences::default(), at());
        assert!(close(r.battery_level.unwrap(), 140.0 / 3.0));

        let raw = RawStationPayload::new(json!({"battery": []}));
        let r = normalize_at(&raw, "st", &UnitPreferences::default(), at());
        assert_eq!(r.battery_level, None);
    }

    #[test]
    fn test_station_name_order_and_envelope() {
        let raw = RawStationPayload::new(json!({
            "code": 0,
            "msg": "success",
            "time": "1699990000",
            "data": {
                "station_name": "Backyard",
                "device": {"name": "GW1100"}
            }
        }));
        let r = normalize_at(&raw, "st", &UnitPreferences::default(), at());
        assert_eq!(r.station_name.as_deref(), Some("Backyard"));
        assert_eq!(r.timestamp.timestamp(), 1_699_990_000);
    }

    #[test]
    fn test_wind_direction_wraps() {
        assert_eq!(wind_direction(360.0), 360.0);
        assert_eq!(wind_direction(370.0), 10.0);
        assert_eq!(wind_direction(-90.0), 270.0);
    }

    #[test]
    fn test_overflowing_readings_fall_back_to_defaults() {
        let raw = RawStationPayload::new(json!({
            "outdoor": {
                "temperature": {"value": "1e308", "unit": "℃"},
                "humidity": {"value": "40"}
            },
            "pressure": {"absolute": {"value": "1e307", "unit": "inHg"}},
            "wind": {"wind_speed": {"value": "1e308", "unit": "m/s"}},
            "rainfall": {"weekly": {"value": "1e308", "unit": "in"}}
        }));
        let prefs = UnitPreferences {
            temperature_unit: TemperatureUnit::Fahrenheit,
            wind_unit: WindUnit::Kmh,
            pressure_unit: PressureUnit::Hpa,
            rainfall_unit: LengthUnit::Millimeters,
        };
        let r = normalize_at(&raw, "st", &prefs, at());

        assert_eq!(r.temperature, 0.0);
        assert_eq!(r.wind_speed, 0.0);
        assert_eq!(r.pressure, 0.0);
        assert_eq!(r.rainfall_weekly, None);
        assert!(r.dew_point.is_finite() && r.dew_point <= r.temperature);
        assert!(r.feels_like.is_finite());

        let json = serde_json::to_value(&r).unwrap();
        for (key, value) in json.as_object().unwrap() {
            assert!(!value.is_null(), "{key} serialized as null");
        }
    }
}
