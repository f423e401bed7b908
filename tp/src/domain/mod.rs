//! Domain types for trip planning
//!
//! - TripContext: validated trip details
//! - SuitabilityDecision: the judge's verdict on the weather
//! - AlternativeOption: destinations offered instead
//! - TravelOptions / ItineraryResult: step 3 output
//! - TripSession: persisted workflow state

mod alternative;
mod decision;
mod id;
mod itinerary;
mod session;
mod trip;

pub use alternative::AlternativeOption;
pub use decision::{DEFAULT_REASONING, DEFAULT_RECOMMENDATION, DecisionRecord, SuitabilityDecision, Verdict};
pub use id::{generate_session_id, is_valid_session_id, slugify};
pub use itinerary::{
    AttractionOption, FlightOption, HotelOption, ItineraryResult, NOT_AVAILABLE, TravelOptions, parse_duration_minutes,
    parse_price, render_table, sort_attractions, sort_flights, sort_hotels,
};
pub use session::{Diagnostic, Step, TripSession, UserChoice};
pub use trip::{
    AnalysisKey, MAX_DURATION_DAYS, MIN_DURATION_DAYS, SearchKey, TripContext, TripInput, ValidationError,
    WeatherSnapshot,
};

/// Current time as Unix milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
