//! Station service: fetch, normalize, reconcile, fall back to synthetic history

use chrono::Utc;
use tracing::{debug, info, warn};
use wxnorm_core::{
    Envelope, HistoricalPoint, Metric, NormalizedReading, PreferencesProvider, RequestUnits,
    SourceUnits, TelemetryFetcher, TimeRange, UnitPreferences,
};

use crate::{
    generate_synthetic, normalize, reconcile_metric, IngestError, IngestResult, SYNTHETIC_HOURS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryOptions {
    /// Hours of history requested from the source
    pub window_hours: u32,
    /// Generate a synthetic series when no real history is usable
    pub synthetic_fallback: bool,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            window_hours: SYNTHETIC_HOURS,
            synthetic_fallback: true,
        }
    }
}

/// A preferences provider that always answers with the same units.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPreferences(pub UnitPreferences);

#[async_trait::async_trait]
impl PreferencesProvider for FixedPreferences {
    async fn preferences(&self, _station_id: &str) -> anyhow::Result<UnitPreferences> {
        Ok(self.0)
    }
}

pub struct StationService<F, P> {
    fetcher: F,
    preferences: P,
    options: HistoryOptions,
}

impl<F, P> StationService<F, P>
where
    F: TelemetryFetcher,
    P: PreferencesProvider,
{
    pub fn new(fetcher: F, preferences: P) -> Self {
        Self {
            fetcher,
            preferences,
            options: HistoryOptions::default(),
        }
    }

    pub fn with_options(mut self, options: HistoryOptions) -> Self {
        self.options = options;
        self
    }

    /// Current normalized reading for a station.
    pub async fn current(&self, station_id: &str) -> IngestResult<NormalizedReading> {
        let prefs = self.resolve_preferences(station_id).await?;
        self.current_with(station_id, &prefs).await
    }

    /// History of one metric over the configured window.
    ///
    /// Falls back to a synthetic series when the source has nothing usable
    /// and the fallback is enabled.
    pub async fn history(
        &self,
        station_id: &str,
        metric: Metric,
    ) -> IngestResult<Vec<HistoricalPoint>> {
        let prefs = self.resolve_preferences(station_id).await?;
        let range = TimeRange::trailing_hours(Utc::now(), self.options.window_hours);
        let units = RequestUnits::from(SourceUnits::canonical());

        let points = match self
            .fetcher
            .fetch_history(station_id, &range, &[metric], &units)
            .await
        {
            Ok(raw) => reconcile_metric(&raw, &prefs, metric),
            Err(e) => {
                warn!(station = station_id, %metric, error = %e, "history fetch failed");
                Vec::new()
            }
        };

        if !points.is_empty() || !self.options.synthetic_fallback {
            debug!(station = station_id, %metric, points = points.len(), "history reconciled");
            return Ok(points);
        }

        info!(station = station_id, %metric, "no usable history, generating synthetic series");
        let current = self.current_with(station_id, &prefs).await?;
        Ok(generate_synthetic(&current, metric, &prefs))
    }

    async fn current_with(
        &self,
        station_id: &str,
        prefs: &UnitPreferences,
    ) -> IngestResult<NormalizedReading> {
        let units = RequestUnits::from(SourceUnits::realtime(prefs));
        let raw = self
            .fetcher
            .fetch_realtime(station_id, &units)
            .await
            .map_err(|e| IngestError::Fetch(format!("{e:#}")))?;

        check_envelope(raw.envelope())?;

        let reading = normalize(&raw, station_id, prefs);
        debug!(station = station_id, "reading normalized");
        Ok(reading)
    }

    async fn resolve_preferences(&self, station_id: &str) -> IngestResult<UnitPreferences> {
        self.preferences
            .preferences(station_id)
            .await
            .map_err(|e| IngestError::Preferences(format!("{e:#}")))
    }
}

fn check_envelope(envelope: Envelope) -> IngestResult<()> {
    if envelope.is_success() {
        return Ok(());
    }
    let err = IngestError::Provider {
        code: envelope.code.unwrap_or_default(),
        message: envelope.message.unwrap_or_default(),
    };
    warn!(error = %err, "provider rejected request");
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wxnorm_core::{RawHistoricalPayload, RawStationPayload, TemperatureUnit};

    struct FakeFetcher {
        realtime: Option<Value>,
        history: Option<Value>,
        realtime_calls: AtomicUsize,
    }

    impl FakeFetcher {
        fn new(realtime: Option<Value>, history: Option<Value>) -> Self {
            Self {
                realtime,
                history,
                realtime_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl TelemetryFetcher for FakeFetcher {
        async fn fetch_realtime(
            &self,
            _station_id: &str,
            units: &RequestUnits,
        ) -> anyhow::Result<RawStationPayload> {
            self.realtime_calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(units.pressure_unitid, 3);
            self.realtime
                .clone()
                .map(RawStationPayload::new)
                .ok_or_else(|| anyhow!("connection refused"))
        }

        async fn fetch_history(
            &self,
            _station_id: &str,
            range: &TimeRange,
            metrics: &[Metric],
            units: &RequestUnits,
        ) -> anyhow::Result<RawHistoricalPayload> {
            assert_eq!(range.end - range.start, chrono::Duration::hours(24));
            assert_eq!(metrics.len(), 1);
            assert_eq!(units.temp_unitid, 1);
            self.history
                .clone()
                .map(RawHistoricalPayload::new)
                .ok_or_else(|| anyhow!("timeout"))
        }
    }

    fn realtime() -> Value {
        json!({
            "code": 0,
            "msg": "success",
            "time": "1700000000",
            "data": {
                "outdoor": {
                    "temperature": {"value": "20", "unit": "℃"},
                    "humidity": {"value": "50", "unit": "%"}
                },
                "rainfall": {"daily": {"value": "0"}}
            }
        })
    }

    fn celsius() -> FixedPreferences {
        FixedPreferences(UnitPreferences {
            temperature_unit: TemperatureUnit::Celsius,
            ..UnitPreferences::default()
        })
    }

    #[tokio::test]
    async fn test_current_normalizes() {
        let service = StationService::new(FakeFetcher::new(Some(realtime()), None), celsius());
        let reading = service.current("st-1").await.unwrap();
        assert_eq!(reading.station_id, "st-1");
        assert_eq!(reading.temperature, 20.0);
        assert_eq!(reading.timestamp.timestamp(), 1_700_000_000);
    }

    #[tokio::test]
    async fn test_provider_error_surfaces() {
        let payload = json!({"code": 40010, "msg": "Illegal Application_Key Parameter", "data": []});
        let service = StationService::new(FakeFetcher::new(Some(payload), None), celsius());
        match service.current("st").await {
            Err(IngestError::Provider { code, message }) => {
                assert_eq!(code, 40010);
                assert!(message.contains("Application_Key"));
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_is_error() {
        let service = StationService::new(FakeFetcher::new(None, None), celsius());
        assert!(matches!(
            service.current("st").await,
            Err(IngestError::Fetch(_))
        ));
    }

    #[tokio::test]
    async fn test_history_uses_real_series() {
        let history = json!({
            "code": 0,
            "data": {"outdoor": {"temperature": {"unit": "℃", "list": {"100": "1", "200": "2"}}}}
        });
        let fetcher = FakeFetcher::new(Some(realtime()), Some(history));
        let service = StationService::new(fetcher, celsius());

        let points = service.history("st", Metric::Temperature).await.unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].value, 2.0);
        assert_eq!(service.fetcher.realtime_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_history_falls_back_to_synthetic() {
        let service = StationService::new(FakeFetcher::new(Some(realtime()), None), celsius());
        let points = service.history("st", Metric::Humidity).await.unwrap();
        assert_eq!(points.len(), 25);
        assert!(points.iter().all(|p| (0.0..=100.0).contains(&p.value)));
        assert_eq!(service.fetcher.realtime_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_history_without_fallback() {
        let service = StationService::new(FakeFetcher::new(Some(realtime()), None), celsius())
            .with_options(HistoryOptions {
                synthetic_fallback: false,
                ..HistoryOptions::default()
            });
        assert!(service.history("st", Metric::Rainfall).await.unwrap().is_empty());
    }
}
