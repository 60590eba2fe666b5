// Rust guideline compliant 2026-10-12

//! WeatherAPI adapter for the `WarningSource` port.
//!
//! Official warnings come from `forecast.json` with `alerts=yes`; current
//! conditions from `current.json`. Both query a single configured location.
//! Without an API key every call returns `SourceError::MissingCredential`
//! before touching the network.

use domain::{CurrentConditions, SourceError, WarningRecord, WarningSource};
use serde::Deserialize;

use crate::config::WeatherSettings;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    alerts: Option<AlertList>,
}

#[derive(Debug, Deserialize)]
struct AlertList {
    #[serde(default)]
    alert: Vec<AlertItem>,
}

#[derive(Debug, Deserialize)]
struct AlertItem {
    #[serde(default)]
    headline: String,
    #[serde(default)]
    desc: String,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    current: Option<Current>,
}

#[derive(Debug, Deserialize)]
struct Current {
    temp_c: f64,
    humidity: u8,
    wind_kph: f64,
    feelslike_c: f64,
    #[serde(default)]
    condition: Option<Condition>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    #[serde(default)]
    text: String,
    #[serde(default)]
    icon: Option<String>,
}

/// Decode a `forecast.json` body into warning records.
///
/// A body without an `alerts` section means "no active warnings".
fn parse_forecast(body: &str) -> Result<Vec<WarningRecord>, SourceError> {
    let response: ForecastResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::Malformed { reason: e.to_string() })?;
    Ok(response
        .alerts
        .map(|a| a.alert)
        .unwrap_or_default()
        .into_iter()
        .map(|a| WarningRecord { headline: a.headline, description: a.desc })
        .collect())
}

/// Decode a `current.json` body. Protocol-relative icon URLs get `https:`.
fn parse_current(body: &str) -> Result<CurrentConditions, SourceError> {
    let response: CurrentResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::Malformed { reason: e.to_string() })?;
    let current = response.current.ok_or_else(|| SourceError::Malformed {
        reason: "response has no `current` object".to_owned(),
    })?;
    let (condition_text, icon) = current
        .condition
        .map(|c| (c.text, c.icon))
        .unwrap_or_default();
    Ok(CurrentConditions {
        condition_text,
        temperature_c: current.temp_c,
        humidity: current.humidity,
        wind_kph: current.wind_kph,
        feels_like_c: current.feelslike_c,
        icon_url: icon.filter(|i| !i.is_empty()).map(|i| {
            if i.starts_with("//") { format!("https:{i}") } else { i }
        }),
    })
}

// ---------------------------------------------------------------------------
// WeatherApiSource
// ---------------------------------------------------------------------------

/// `WarningSource` adapter querying a WeatherAPI-compatible HTTP endpoint.
#[derive(Debug, Clone)]
pub struct WeatherApiSource {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    location: String,
}

impl WeatherApiSource {
    /// Create a source sharing `client` (and its timeout) with other adapters.
    #[must_use]
    pub fn new(client: reqwest::Client, settings: &WeatherSettings) -> Self {
        Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_owned(),
            api_key: settings.api_key.clone(),
            location: settings.location.clone(),
        }
    }

    async fn get(&self, endpoint: &str, extra: &[(&str, &str)]) -> Result<String, SourceError> {
        let key = self.api_key.as_deref().ok_or(SourceError::MissingCredential)?;
        let url = format!("{}/{endpoint}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("key", key), ("q", self.location.as_str())])
            .query(extra)
            .send()
            .await
            .map_err(|e| SourceError::Unavailable { reason: e.to_string() })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Unavailable { reason: e.to_string() })?;
        if !status.is_success() {
            tracing::error!(%status, endpoint, body = %body, "weather_api.http_error");
            return Err(SourceError::Unavailable { reason: format!("{endpoint} returned {status}") });
        }
        Ok(body)
    }
}

impl WarningSource for WeatherApiSource {
    async fn active_warnings(&self) -> Result<Vec<WarningRecord>, SourceError> {
        let body = self
            .get("forecast.json", &[("days", "1"), ("alerts", "yes"), ("aqi", "no")])
            .await?;
        let warnings = parse_forecast(&body)?;
        tracing::debug!(count = warnings.len(), "weather_api.warnings");
        Ok(warnings)
    }

    async fn current_conditions(&self) -> Result<CurrentConditions, SourceError> {
        let body = self.get("current.json", &[("aqi", "no")]).await?;
        parse_current(&body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::{WeatherApiSource, parse_current, parse_forecast};
    use crate::config::WeatherSettings;
    use domain::{SourceError, WarningSource as _};

    #[test]
    fn forecast_with_alerts() {
        let body = r#"{
            "location": {"name": "Santa Isabel"},
            "alerts": {"alert": [
                {"headline": "Chuvas Intensas", "desc": "Chuva entre 20 e 30 mm/h.", "severity": "Moderate"},
                {"headline": "Acumulado de Chuvas", "desc": "Chuva acumulada de 50 mm/dia."}
            ]}
        }"#;
        let warnings = parse_forecast(body).unwrap();
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].headline, "Chuvas Intensas");
        assert_eq!(warnings[1].description, "Chuva acumulada de 50 mm/dia.");
    }

    #[test]
    fn forecast_without_alerts_is_empty() {
        assert!(parse_forecast(r#"{"alerts": {"alert": []}}"#).unwrap().is_empty());
        assert!(parse_forecast(r#"{"forecast": {}}"#).unwrap().is_empty());
    }

    #[test]
    fn forecast_garbage_is_malformed() {
        assert!(matches!(parse_forecast("<html>"), Err(SourceError::Malformed { .. })));
    }

    #[test]
    fn current_maps_fields_and_icon() {
        let body = r#"{"current": {
            "temp_c": 21.3, "humidity": 88, "wind_kph": 11.2, "feelslike_c": 21.0,
            "condition": {"text": "Light rain", "icon": "//cdn.weatherapi.com/weather/64x64/day/296.png"}
        }}"#;
        let c = parse_current(body).unwrap();
        assert_eq!(c.condition_text, "Light rain");
        assert_eq!(c.humidity, 88);
        assert_eq!(
            c.icon_url.as_deref(),
            Some("https://cdn.weatherapi.com/weather/64x64/day/296.png")
        );
    }

    #[test]
    fn current_missing_object_is_malformed() {
        assert!(matches!(
            parse_current(r#"{"error": {"code": 1006}}"#),
            Err(SourceError::Malformed { .. })
        ));
    }

    #[tokio::test]
    async fn missing_key_short_circuits_before_network() {
        let source = WeatherApiSource::new(
            reqwest::Client::new(),
            &WeatherSettings {
                api_key: None,
                // Unroutable: reaching the network would fail differently.
                base_url: "http://127.0.0.1:9".to_owned(),
                location: "X".to_owned(),
            },
        );
        assert_eq!(source.active_warnings().await, Err(SourceError::MissingCredential));
        assert_eq!(source.current_conditions().await, Err(SourceError::MissingCredential));
    }
}
