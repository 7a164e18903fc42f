//! Daily summaries from National Weather Service forecast periods

use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{IngestError, IngestResult};

/// Days kept in a condensed forecast.
pub const MAX_FORECAST_DAYS: usize = 7;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuantitativeValue {
    pub value: Option<f64>,
}

/// One period of a gridpoint forecast (`properties.periods[]`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPeriod {
    #[serde(default)]
    pub name: String,
    pub start_time: DateTime<FixedOffset>,
    pub is_daytime: bool,
    pub temperature: f64,
    #[serde(default)]
    pub short_forecast: Option<String>,
    #[serde(default)]
    pub detailed_forecast: Option<String>,
    #[serde(default)]
    pub wind_speed: Option<String>,
    #[serde(default)]
    pub relative_humidity: Option<QuantitativeValue>,
    #[serde(default)]
    pub probability_of_precipitation: Option<QuantitativeValue>,
}

impl ForecastPeriod {
    fn date(&self) -> NaiveDate {
        self.start_time.date_naive()
    }

    fn is_night(&self) -> bool {
        !self.is_daytime && self.name.to_lowercase().contains("night")
    }
}

/// Coarse sky condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Condition {
    PartlyCloudy,
    Sunny,
    Cloudy,
    Rain,
    Storm,
    Snow,
    Fog,
    Windy,
    Hot,
    Cold,
    Fair,
}

impl Condition {
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if has(&["partly cloudy", "partly sunny"]) {
            Condition::PartlyCloudy
        } else if has(&["sunny", "clear"]) {
            Condition::Sunny
        } else if has(&["cloudy", "overcast"]) {
            Condition::Cloudy
        } else if has(&["rain", "shower"]) {
            Condition::Rain
        } else if has(&["storm", "thunder"]) {
            Condition::Storm
        } else if has(&["snow", "blizzard"]) {
            Condition::Snow
        } else if has(&["fog", "mist"]) {
            Condition::Fog
        } else if has(&["wind"]) {
            Condition::Windy
        } else if has(&["hot"]) {
            Condition::Hot
        } else if has(&["cold"]) {
            Condition::Cold
        } else {
            Condition::Fair
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    pub date: NaiveDate,
    /// "Today", "Tomorrow" or a short weekday name
    pub label: String,
    pub condition: String,
    pub kind: Condition,
    pub high: f64,
    pub low: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<f64>,
}

/// Pull `properties.periods` (or a bare `periods`) out of a forecast document.
pub fn parse_periods(doc: &Value) -> IngestResult<Vec<ForecastPeriod>> {
    let periods = doc
        .pointer("/properties/periods")
        .or_else(|| doc.get("periods"))
        .ok_or_else(|| IngestError::Structural("forecast has no periods".to_string()))?;
    Vec::<ForecastPeriod>::deserialize(periods)
        .map_err(|e| IngestError::Structural(format!("invalid forecast period: {e}")))
}

/// Condense forecast periods into at most [`MAX_FORECAST_DAYS`] days.
pub fn condense_forecast(periods: &[ForecastPeriod], today: NaiveDate) -> Vec<ForecastDay> {
    let mut days: Vec<ForecastDay> = Vec::new();

    for period in periods {
        let date = period.date();
        if days.iter().any(|d| d.date == date) {
            continue;
        }

        let same_day = || periods.iter().filter(move |p| p.date() == date);
        let night = same_day().find(|p| p.is_night());
        let high = same_day()
            .find(|p| p.is_daytime)
            .map_or(period.temperature, |p| p.temperature);
        let low = night.map_or(period.temperature - 10.0, |p| p.temperature);

        let text = period
            .short_forecast
            .as_deref()
            .or(period.detailed_forecast.as_deref())
            .unwrap_or("Unknown");

        days.push(ForecastDay {
            date,
            label: day_label(date, today),
            condition: clean_condition(period.short_forecast.as_deref().unwrap_or("Unknown")),
            kind: Condition::classify(text),
            high,
            low,
            humidity: period.relative_humidity.as_ref().and_then(|v| v.value),
            wind_speed: period.wind_speed.as_deref().and_then(parse_wind_speed),
            precipitation: period
                .probability_of_precipitation
                .as_ref()
                .and_then(|v| v.value),
        });

        if days.len() >= MAX_FORECAST_DAYS {
            break;
        }
    }

    days
}

pub fn day_label(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Today".to_string()
    } else if today.checked_add_days(Days::new(1)) == Some(date) {
        "Tomorrow".to_string()
    } else {
        date.format("%a").to_string()
    }
}

/// Drop unit tokens and collapse whitespace.
fn clean_condition(text: &str) -> String {
    text.split_whitespace()
        .filter(|word| {
            let bare = word
                .trim_matches(|c: char| c.is_ascii_punctuation())
                .to_lowercase();
            !matches!(bare.as_str(), "mph" | "°f" | "°c")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// First integer in text like "10 to 15 mph".
fn parse_wind_speed(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
