use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

use crate::{Metric, RawHistoricalPayload, RawStationPayload, RequestUnits, UnitPreferences};

/// Closed time window for a history request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn trailing_hours(end: DateTime<Utc>, hours: u32) -> Self {
        Self {
            start: end - Duration::hours(i64::from(hours)),
            end,
        }
    }
}

/// Retrieves raw payloads from the station data source.
#[async_trait::async_trait]
pub trait TelemetryFetcher: Send + Sync {
    async fn fetch_realtime(
        &self,
        station_id: &str,
        units: &RequestUnits,
    ) -> Result<RawStationPayload>;

    async fn fetch_history(
        &self,
        station_id: &str,
        range: &TimeRange,
        metrics: &[Metric],
        units: &RequestUnits,
    ) -> Result<RawHistoricalPayload>;
}

/// Looks up the output units a caller wants for a station.
#[async_trait::async_trait]
pub trait PreferencesProvider: Send + Sync {
    async fn preferences(&self, station_id: &str) -> Result<UnitPreferences>;
}
