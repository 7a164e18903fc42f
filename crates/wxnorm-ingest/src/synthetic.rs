//! Synthetic 24-hour history
//!
//! Fallback used when no real history is available. Shapes are rough and only
//! promise plausibility: non-negative values near the current reading.

use std::f64::consts::PI;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use wxnorm_core::{
    convert, HistoricalPoint, Metric, NormalizedReading, PressureUnit, TemperatureUnit,
    UnitPreferences, WindUnit,
};

/// Hours covered; the series holds `SYNTHETIC_HOURS + 1` hourly points.
pub const SYNTHETIC_HOURS: u32 = 24;

/// Generator for synthetic series with a substitutable random source.
pub struct SyntheticGenerator<R> {
    rng: R,
}

impl SyntheticGenerator<rand::rngs::ThreadRng> {
    pub fn new() -> Self {
        Self { rng: rand::rng() }
    }
}

impl Default for SyntheticGenerator<rand::rngs::ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> SyntheticGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    pub fn generate(
        &mut self,
        current: &NormalizedReading,
        metric: Metric,
        prefs: &UnitPreferences,
    ) -> Vec<HistoricalPoint> {
        self.generate_at(current, metric, prefs, Utc::now())
    }

    /// Points for hours -24..=0 relative to `now`, oldest first.
    pub fn generate_at(
        &mut self,
        current: &NormalizedReading,
        metric: Metric,
        prefs: &UnitPreferences,
        now: DateTime<Utc>,
    ) -> Vec<HistoricalPoint> {
        let seed = seed_value(current, metric, prefs);

        (0..=SYNTHETIC_HOURS)
            .rev()
            .map(|hours_back| HistoricalPoint {
                timestamp: now - Duration::hours(i64::from(hours_back)),
                value: self.vary(metric, seed, hours_back),
            })
            .collect()
    }

    fn vary(&mut self, metric: Metric, current: f64, hours_back: u32) -> f64 {
        match metric {
            Metric::Temperature => self.temperature(current, hours_back),
            Metric::Humidity => self.humidity(current, hours_back),
            Metric::Pressure => self.pressure(current),
            Metric::WindSpeed => self.wind_speed(current),
            Metric::Rainfall => self.rainfall(current),
        }
    }

    fn noise(&mut self, span: f64) -> f64 {
        (self.rng.random::<f64>() - 0.5) * span
    }

    // Warmest mid-window, with a slow warming trend toward now.
    fn temperature(&mut self, current: f64, hours_back: u32) -> f64 {
        let daily = (cycle_position(hours_back) + PI / 2.0).sin() * 5.0;
        let noise = self.noise(2.0);
        let trend = f64::from(SYNTHETIC_HOURS - hours_back) * 0.1;
        (current + daily + noise + trend).max(0.0)
    }

    fn humidity(&mut self, current: f64, hours_back: u32) -> f64 {
        let daily = cycle_position(hours_back).sin() * 10.0;
        let noise = self.noise(5.0);
        (current + daily + noise).clamp(0.0, 100.0)
    }

    fn pressure(&mut self, current: f64) -> f64 {
        let trend = self.noise(0.5);
        let noise = self.noise(0.3);
        (current + trend + noise).max(0.0)
    }

    fn wind_speed(&mut self, current: f64) -> f64 {
        let gust = if self.rng.random::<f64>() < 0.1 {
            self.rng.random::<f64>() * current * 0.5
        } else {
            0.0
        };
        let noise = self.noise(current * 0.6);
        (current + gust + noise).max(0.0)
    }

    // How much of today's total had accumulated by then.
    fn rainfall(&mut self, current: f64) -> f64 {
        let current = current.max(0.0);
        if current == 0.0 {
            return if self.rng.random::<f64>() < 0.05 {
                self.rng.random::<f64>() * 0.1
            } else {
                0.0
            };
        }

        let fraction = if self.rng.random::<f64>() < 0.3 { 0.3 } else { 0.5 };
        (current - self.rng.random::<f64>() * current * fraction).max(0.0)
    }
}

/// Generate with the thread-local RNG.
pub fn generate_synthetic(
    current: &NormalizedReading,
    metric: Metric,
    prefs: &UnitPreferences,
) -> Vec<HistoricalPoint> {
    SyntheticGenerator::new().generate(current, metric, prefs)
}

fn cycle_position(hours_back: u32) -> f64 {
    f64::from(hours_back) / f64::from(SYNTHETIC_HOURS) * 2.0 * PI
}

/// The current value, or a typical one in the caller's units if not finite.
fn seed_value(current: &NormalizedReading, metric: Metric, prefs: &UnitPreferences) -> f64 {
    let value = current.metric_value(metric);
    // A station without a barometer reports 0; no real pressure is that low.
    let usable = match metric {
        Metric::Pressure => value.is_finite() && value > 0.0,
        _ => value.is_finite(),
    };
    if usable {
        return value;
    }
    match metric {
        Metric::Temperature => convert(70.0, TemperatureUnit::Fahrenheit, prefs.temperature_unit),
        Metric::Humidity => 50.0,
        Metric::Pressure => convert(29.92, PressureUnit::Inhg, prefs.pressure_unit),
        Metric::WindSpeed => convert(5.0, WindUnit::Mph, prefs.wind_unit),
        Metric::Rainfall => 0.0,
    }
}
