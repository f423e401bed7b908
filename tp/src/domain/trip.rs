//! Trip context and input validation

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shortest trip the planner accepts
pub const MIN_DURATION_DAYS: u32 = 1;

/// Longest trip the planner accepts
pub const MAX_DURATION_DAYS: u32 = 30;

/// Input rejected before the workflow leaves step 1
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a starting city")]
    MissingStartingCity,

    #[error("Please enter a destination city")]
    MissingDestination,

    #[error("Trip duration must be between {MIN_DURATION_DAYS} and {MAX_DURATION_DAYS} days, got {0}")]
    DurationOutOfRange(u32),
}

/// Raw trip request as typed by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripInput {
    pub starting_city: String,
    pub destination_city: String,
    pub travel_date: NaiveDate,
    pub duration_days: u32,
}

impl TripInput {
    pub fn new(
        starting_city: impl Into<String>,
        destination_city: impl Into<String>,
        travel_date: NaiveDate,
        duration_days: u32,
    ) -> Self {
        Self {
            starting_city: starting_city.into(),
            destination_city: destination_city.into(),
            travel_date,
            duration_days,
        }
    }

    /// Validate the input, producing a context with trimmed city names
    pub fn validate(&self) -> Result<TripContext, ValidationError> {
        let starting_city = self.starting_city.trim();
        let destination_city = self.destination_city.trim();

        if starting_city.is_empty() {
            return Err(ValidationError::MissingStartingCity);
        }
        if destination_city.is_empty() {
            return Err(ValidationError::MissingDestination);
        }
        if !(MIN_DURATION_DAYS..=MAX_DURATION_DAYS).contains(&self.duration_days) {
            return Err(ValidationError::DurationOutOfRange(self.duration_days));
        }

        Ok(TripContext {
            starting_city: starting_city.to_string(),
            destination_city: destination_city.to_string(),
            travel_date: self.travel_date,
            duration_days: self.duration_days,
        })
    }
}

/// A validated trip request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripContext {
    pub starting_city: String,
    pub destination_city: String,
    pub travel_date: NaiveDate,
    pub duration_days: u32,
}

impl TripContext {
    /// Key identifying the weather analysis this context needs
    pub fn analysis_key(&self) -> AnalysisKey {
        AnalysisKey {
            destination: self.destination_city.clone(),
            travel_date: self.travel_date,
        }
    }

    /// Key identifying the travel search this context needs
    pub fn search_key(&self) -> SearchKey {
        SearchKey {
            origin: self.starting_city.clone(),
            destination: self.destination_city.clone(),
            travel_date: self.travel_date,
        }
    }

    /// Same trip with another destination
    pub fn with_destination(&self, destination: impl Into<String>) -> Self {
        Self {
            destination_city: destination.into(),
            ..self.clone()
        }
    }

    pub fn to_input(&self) -> TripInput {
        TripInput::new(
            self.starting_city.clone(),
            self.destination_city.clone(),
            self.travel_date,
            self.duration_days,
        )
    }
}

/// Destination and date a weather snapshot or decision was produced for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisKey {
    pub destination: String,
    pub travel_date: NaiveDate,
}

impl std::fmt::Display for AnalysisKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} on {}", self.destination, self.travel_date)
    }
}

/// Route and date a set of travel options was fetched for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchKey {
    pub origin: String,
    pub destination: String,
    pub travel_date: NaiveDate,
}

/// Weather text for one destination and date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub key: AnalysisKey,
    pub text: String,
    pub fetched_at: i64,
}

impl WeatherSnapshot {
    pub fn new(key: AnalysisKey, text: impl Into<String>) -> Self {
        Self {
            key,
            text: text.into(),
            fetched_at: super::now_ms(),
        }
    }
}
