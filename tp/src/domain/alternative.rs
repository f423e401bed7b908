//! Alternative destination suggestion

use serde::{Deserialize, Serialize};

/// A destination offered instead of one with unsuitable weather
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeOption {
    pub city: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub expected_weather: String,
}

impl AlternativeOption {
    pub fn new(city: impl Into<String>, reason: impl Into<String>, expected_weather: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            reason: reason.into(),
            expected_weather: expected_weather.into(),
        }
    }
}
