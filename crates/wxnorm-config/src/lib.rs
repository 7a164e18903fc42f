use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use wxnorm_core::{LengthUnit, PressureUnit, TemperatureUnit, UnitPreferences, WindUnit};

const DEFAULT_HISTORY_HOURS: u32 = 24;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UnitsConfig {
    pub temperature: Option<TemperatureUnit>,
    pub wind: Option<WindUnit>,
    pub pressure: Option<PressureUnit>,
    pub rainfall: Option<LengthUnit>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HistoryConfig {
    pub window_hours: Option<u32>,
    pub synthetic_fallback: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StationConfig {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub units: Option<UnitsConfig>,
    pub history: Option<HistoryConfig>,
    pub station: Option<StationConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppConfig {
    /// Load configuration from WXNORM_CONFIG path (TOML) if present, with reasonable defaults
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("WXNORM_CONFIG").unwrap_or_else(|_| "wxnorm.toml".to_string());
        Self::load_from(path)
    }

    /// Load from an explicit path; a missing file gives the defaults.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let cfg = if path.exists() {
            let s = fs::read_to_string(path)?;
            toml::from_str::<AppConfig>(&s)?
        } else {
            AppConfig::default()
        };
        Ok(cfg)
    }

    /// Unit preferences, falling back per field to fahrenheit/mph/inHg/in
    pub fn unit_preferences(&self) -> UnitPreferences {
        let defaults = UnitPreferences::default();
        let units = self.units.clone().unwrap_or_default();
        UnitPreferences {
            temperature_unit: units.temperature.unwrap_or(defaults.temperature_unit),
            wind_unit: units.wind.unwrap_or(defaults.wind_unit),
            pressure_unit: units.pressure.unwrap_or(defaults.pressure_unit),
            rainfall_unit: units.rainfall.unwrap_or(defaults.rainfall_unit),
        }
    }

    /// History window in hours (default 24)
    pub fn history_window_hours(&self) -> u32 {
        self.history
            .as_ref()
            .and_then(|h| h.window_hours)
            .unwrap_or(DEFAULT_HISTORY_HOURS)
    }

    /// Whether to synthesize history when none is available (default true)
    pub fn synthetic_fallback(&self) -> bool {
        self.history
            .as_ref()
            .and_then(|h| h.synthetic_fallback)
            .unwrap_or(true)
    }

    pub fn station_id(&self) -> Option<&str> {
        self.station.as_ref().and_then(|s| s.id.as_deref())
    }

    /// Name to use when a payload carries none
    pub fn station_name(&self) -> Option<&str> {
        self.station.as_ref().and_then(|s| s.name.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_unit_preferences_default() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.unit_preferences(), UnitPreferences::default());
        assert_eq!(cfg.history_window_hours(), 24);
        assert!(cfg.synthetic_fallback());
        assert_eq!(cfg.station_name(), None);
    }

    #[test]
    fn partial_units_fall_back_per_field() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [units]
            temperature = "celsius"
            rainfall = "mm"

            [history]
            window_hours = 12
            synthetic_fallback = false

            [station]
            id = "8C:4F:00:02:EC:A7"
            name = "Backyard"
            "#,
        )
        .unwrap();

        let prefs = cfg.unit_preferences();
        assert_eq!(prefs.temperature_unit, TemperatureUnit::Celsius);
        assert_eq!(prefs.rainfall_unit, LengthUnit::Millimeters);
        assert_eq!(prefs.wind_unit, WindUnit::Mph);
        assert_eq!(prefs.pressure_unit, PressureUnit::Inhg);
        assert_eq!(cfg.history_window_hours(), 12);
        assert!(!cfg.synthetic_fallback());
        assert_eq!(cfg.station_id(), Some("8C:4F:00:02:EC:A7"));
        assert_eq!(cfg.station_name(), Some("Backyard"));
    }

    #[test]
    fn load_from_file_and_missing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[units]\nwind = \"knots\"").unwrap();
        let cfg = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(cfg.unit_preferences().wind_unit, WindUnit::Knots);

        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.unit_preferences(), UnitPreferences::default());
    }

    #[test]
    fn invalid_toml_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[units]\npressure = \"furlongs\"").unwrap();
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ConfigError::Toml(_))
        ));
    }
}
