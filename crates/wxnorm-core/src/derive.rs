//! Derived meteorological quantities
//!
//! Inputs and outputs are canonical: Celsius, m/s, relative humidity in
//! percent. Conversion to caller units happens outside this module.

// Magnus coefficients
const MAGNUS_A: f64 = 17.27;
const MAGNUS_B: f64 = 237.7;

// Heat index coefficients, Celsius form
const HI_C1: f64 = -8.78469475556;
const HI_C2: f64 = 1.61139411;
const HI_C3: f64 = 2.33854883889;
const HI_C4: f64 = -0.14611605;
const HI_C5: f64 = -0.012308094;
const HI_C6: f64 = -0.0164248277778;
const HI_C7: f64 = 0.002211732;
const HI_C8: f64 = 0.00072546;
const HI_C9: f64 = -0.000003582;

/// Heat index applies at or above this temperature (°C).
pub const HEAT_INDEX_MIN_C: f64 = 27.0;
/// Wind chill applies at or below this temperature (°C).
pub const WIND_CHILL_MAX_C: f64 = 10.0;
/// Wind chill needs wind strictly above this speed (m/s).
pub const WIND_CHILL_MIN_MS: f64 = 1.39;

/// Lowest humidity fed to the Magnus formula. `ln(0)` has no finite dew point.
pub const MIN_DERIVATION_HUMIDITY: f64 = 1.0;

/// Which apparent-temperature model a (temperature, wind) pair falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApparentModel {
    HeatIndex,
    WindChill,
    Ambient,
}

impl ApparentModel {
    pub fn select(temp_c: f64, wind_ms: f64) -> Self {
        if temp_c >= HEAT_INDEX_MIN_C {
            ApparentModel::HeatIndex
        } else if temp_c <= WIND_CHILL_MAX_C && wind_ms > WIND_CHILL_MIN_MS {
            ApparentModel::WindChill
        } else {
            ApparentModel::Ambient
        }
    }
}

/// Dew point by the Magnus approximation.
///
/// Not finite when `humidity <= 0` or `temp_c == -237.7`; run the humidity
/// through [`clamp_humidity_for_derivation`] first.
pub fn dew_point(temp_c: f64, humidity: f64) -> f64 {
    let alpha = (MAGNUS_A * temp_c) / (MAGNUS_B + temp_c) + (humidity / 100.0).ln();
    (MAGNUS_B * alpha) / (MAGNUS_A - alpha)
}

/// Apparent ("feels like") temperature.
pub fn feels_like(temp_c: f64, humidity: f64, wind_ms: f64) -> f64 {
    match ApparentModel::select(temp_c, wind_ms) {
        ApparentModel::HeatIndex => heat_index(temp_c, humidity),
        ApparentModel::WindChill => wind_chill(temp_c, wind_ms),
        ApparentModel::Ambient => temp_c,
    }
}

pub fn heat_index(temp_c: f64, humidity: f64) -> f64 {
    let t = temp_c;
    let rh = humidity;
    HI_C1
        + HI_C2 * t
        + HI_C3 * rh
        + HI_C4 * t * rh
        + HI_C5 * t * t
        + HI_C6 * rh * rh
        + HI_C7 * t * t * rh
        + HI_C8 * t * rh * rh
        + HI_C9 * t * t * rh * rh
}

pub fn wind_chill(temp_c: f64, wind_ms: f64) -> f64 {
    let v = (wind_ms * 3.6).powf(0.16);
    13.12 + 0.6215 * temp_c - 11.37 * v + 0.3965 * temp_c * v
}

/// Clamp a humidity reading into `[0, 100]`, mapping non-finite input to 0.
pub fn clamp_humidity(humidity: f64) -> f64 {
    if humidity.is_finite() {
        humidity.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Humidity as fed to [`dew_point`]: within `[MIN_DERIVATION_HUMIDITY, 100]`.
pub fn clamp_humidity_for_derivation(humidity: f64) -> f64 {
    clamp_humidity(humidity).max(MIN_DERIVATION_HUMIDITY)
}
