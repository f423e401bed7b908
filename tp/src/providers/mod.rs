//! External data providers
//!
//! The workflow sees weather and travel search only through the
//! `WeatherProvider` and `SearchProvider` traits. The HTTP adapters here
//! (OpenWeatherMap, SerpApi) are thin and consume only the fields they need.

mod search;
mod weather;

use std::time::Duration;

use thiserror::Error;

pub use search::{SearchProvider, SerpApiClient};
pub use weather::{OpenWeatherMapClient, WeatherProvider};

/// Errors from weather or search providers
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Provider API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Location not found: {0}")]
    NotFound(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider call timed out after {0:?}")]
    Timeout(Duration),
}

/// Turn a non-success HTTP response into a `ProviderError`
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(ProviderError::Api {
        status: status.as_u16(),
        message,
    })
}
