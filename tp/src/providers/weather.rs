//! Weather provider
//!
//! OpenWeatherMap current-weather adapter. The workflow treats the result as
//! opaque text, so the adapter renders a short human-readable report.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::{ProviderError, check_status};
use crate::config::WeatherConfig;

/// Source of weather text for a location
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Fetch a human-readable weather report for `query` (a city name)
    async fn fetch(&self, query: &str) -> Result<String, ProviderError>;
}

/// OpenWeatherMap API client
pub struct OpenWeatherMapClient {
    api_key: String,
    base_url: String,
    units: String,
    http: Client,
}

impl OpenWeatherMapClient {
    pub fn from_config(config: &WeatherConfig) -> Result<Self, ProviderError> {
        debug!(base_url = %config.base_url, "OpenWeatherMapClient::from_config: called");
        let api_key = config.get_api_key().map_err(|e| ProviderError::Config(e.to_string()))?;
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            units: config.units.clone(),
            http,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherMapClient {
    async fn fetch(&self, query: &str) -> Result<String, ProviderError> {
        debug!(%query, "fetch: called");
        let url = format!("{}/data/2.5/weather", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("q", query), ("appid", self.api_key.as_str()), ("units", self.units.as_str())])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(query.to_string()));
        }
        let response = check_status(response).await?;
        let current: CurrentWeather = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        info!(%query, "fetch: weather received");
        Ok(render_report(query, &current, &self.units))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CurrentWeather {
    weather: Vec<Condition>,
    main: MainReadings,
    wind: Wind,
    clouds: Clouds,
    rain: Option<Precipitation>,
    snow: Option<Precipitation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Condition {
    description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MainReadings {
    temp: Option<f64>,
    feels_like: Option<f64>,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Wind {
    speed: Option<f64>,
    deg: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Clouds {
    all: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Precipitation {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
    #[serde(rename = "3h")]
    three_hours: Option<f64>,
}

fn reading(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.1}{}", v, unit),
        None => "unknown".to_string(),
    }
}

fn precipitation(p: &Option<Precipitation>) -> String {
    match p {
        Some(Precipitation {
            one_hour: Some(mm), ..
        }) => format!("{:.1} mm in the last hour", mm),
        Some(Precipitation {
            three_hours: Some(mm), ..
        }) => format!("{:.1} mm in the last 3 hours", mm),
        _ => "none".to_string(),
    }
}

fn render_report(location: &str, w: &CurrentWeather, units: &str) -> String {
    let (temp_unit, speed_unit) = match units {
        "imperial" => ("°F", "mph"),
        "standard" => ("K", "m/s"),
        _ => ("°C", "m/s"),
    };
    let status = w
        .weather
        .iter()
        .map(|c| c.description.as_str())
        .filter(|d| !d.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    let mut lines = vec![
        format!("In {}, the current weather is as follows:", location),
        format!("Detailed status: {}", if status.is_empty() { "unknown" } else { &status }),
        format!(
            "Wind speed: {}, direction: {}",
            reading(w.wind.speed, &format!(" {}", speed_unit)),
            reading(w.wind.deg, "°")
        ),
        format!("Humidity: {}", reading(w.main.humidity, "%")),
        "Temperature:".to_string(),
        format!("  - Current: {}", reading(w.main.temp, temp_unit)),
        format!("  - High: {}", reading(w.main.temp_max, temp_unit)),
        format!("  - Low: {}", reading(w.main.temp_min, temp_unit)),
        format!("  - Feels like: {}", reading(w.main.feels_like, temp_unit)),
        format!("Rain: {}", precipitation(&w.rain)),
    ];
    if w.snow.is_some() {
        lines.push(format!("Snow: {}", precipitation(&w.snow)));
    }
    lines.push(format!("Cloud cover: {}", reading(w.clouds.all, "%")));
    lines.join("\n")
}
