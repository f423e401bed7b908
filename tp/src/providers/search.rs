//! Travel search provider
//!
//! SerpApi adapter over the Google engine. Flights come from the
//! `google_flights` answer box, hotels from the answer box hotel list,
//! attractions from `top_sights`. Results are returned sorted.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{ProviderError, check_status};
use crate::config::SearchConfig;
use crate::domain::{
    AttractionOption, FlightOption, HotelOption, NOT_AVAILABLE, sort_attractions, sort_flights, sort_hotels,
};

/// Source of flights, hotels and attractions
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Flights from `origin` to `destination` on `date`, shortest then cheapest first
    async fn flights(&self, origin: &str, destination: &str, date: NaiveDate) -> Result<Vec<FlightOption>, ProviderError>;

    /// Hotels in `location`, best rated then cheapest first
    async fn hotels(&self, location: &str) -> Result<Vec<HotelOption>, ProviderError>;

    /// Attractions in `location`, best rated first
    async fn attractions(&self, location: &str) -> Result<Vec<AttractionOption>, ProviderError>;
}

/// SerpApi client
pub struct SerpApiClient {
    api_key: String,
    base_url: String,
    location: String,
    http: Client,
}

impl SerpApiClient {
    pub fn from_config(config: &SearchConfig) -> Result<Self, ProviderError> {
        debug!(base_url = %config.base_url, "SerpApiClient::from_config: called");
        let api_key = config.get_api_key().map_err(|e| ProviderError::Config(e.to_string()))?;
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            location: config.location.clone(),
            http,
        })
    }

    async fn search(&self, params: &[(&str, &str)]) -> Result<SearchResults, ProviderError> {
        debug!(?params, "search: called");
        let url = format!("{}/search.json", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("engine", "google"), ("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;
        let response = check_status(response).await?;
        let results: SearchResults = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        if let Some(error) = results.error.as_deref() {
            return Err(ProviderError::Api {
                status: 200,
                message: error.to_string(),
            });
        }
        Ok(results)
    }
}

#[async_trait]
impl SearchProvider for SerpApiClient {
    async fn flights(&self, origin: &str, destination: &str, date: NaiveDate) -> Result<Vec<FlightOption>, ProviderError> {
        debug!(%origin, %destination, %date, "flights: called");
        let query = format!("Flights from {} to {} on {}", origin, destination, date);
        let results = self
            .search(&[
                ("q", query.as_str()),
                ("location", self.location.as_str()),
                ("google_domain", "google.com"),
                ("gl", "us"),
                ("hl", "en"),
            ])
            .await?;
        let flights = parse_flights(results);
        info!(%destination, count = flights.len(), "flights: results parsed");
        Ok(flights)
    }

    async fn hotels(&self, location: &str) -> Result<Vec<HotelOption>, ProviderError> {
        debug!(%location, "hotels: called");
        let query = format!("Hotels in {}", location);
        let results = self.search(&[("q", query.as_str())]).await?;
        let hotels = parse_hotels(results);
        info!(%location, count = hotels.len(), "hotels: results parsed");
        Ok(hotels)
    }

    async fn attractions(&self, location: &str) -> Result<Vec<AttractionOption>, ProviderError> {
        debug!(%location, "attractions: called");
        let query = format!("Attractions in {}", location);
        let results = self.search(&[("q", query.as_str())]).await?;
        let attractions = parse_attractions(results);
        info!(%location, count = attractions.len(), "attractions: results parsed");
        Ok(attractions)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchResults {
    error: Option<String>,
    answer_box: Option<AnswerBox>,
    top_sights: Option<TopSights>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AnswerBox {
    #[serde(rename = "type")]
    kind: Option<String>,
    flights: Vec<RawFlight>,
    hotels: Vec<RawListing>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFlight {
    flight_info: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawListing {
    title: Option<String>,
    description: Option<String>,
    price: Option<Value>,
    rating: Option<Value>,
    image: Option<String>,
    thumbnail: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TopSights {
    sights: Vec<RawListing>,
}

/// Render a loosely typed field as display text
fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => NOT_AVAILABLE.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Coerce a rating to a number; anything unparsable is missing
fn rating(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_flights(results: SearchResults) -> Vec<FlightOption> {
    let mut flights: Vec<FlightOption> = match results.answer_box {
        Some(answer) if answer.kind.as_deref() == Some("google_flights") => answer
            .flights
            .iter()
            .map(|f| {
                let field = |i: usize| text(f.flight_info.get(i));
                FlightOption {
                    airline: field(0),
                    duration: field(1),
                    kind: field(2),
                    price: field(3),
                }
            })
            .collect(),
        _ => vec![FlightOption::not_available()],
    };
    sort_flights(&mut flights);
    flights
}

fn parse_hotels(results: SearchResults) -> Vec<HotelOption> {
    let mut hotels: Vec<HotelOption> = results
        .answer_box
        .map(|a| a.hotels)
        .unwrap_or_default()
        .into_iter()
        .map(|h| HotelOption {
            name: text(h.title.map(Value::String).as_ref()),
            price: text(h.price.as_ref()),
            rating: rating(h.rating.as_ref()),
            image: h.image,
        })
        .collect();
    sort_hotels(&mut hotels);
    hotels
}

fn parse_attractions(results: SearchResults) -> Vec<AttractionOption> {
    let mut attractions: Vec<AttractionOption> = results
        .top_sights
        .map(|t| t.sights)
        .unwrap_or_default()
        .into_iter()
        .map(|s| AttractionOption {
            place: text(s.title.map(Value::String).as_ref()),
            description: s.description.unwrap_or_default(),
            rating: rating(s.rating.as_ref()),
            thumbnail: s.thumbnail,
        })
        .collect();
    sort_attractions(&mut attractions);
    attractions
}
