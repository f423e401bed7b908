//! TripSession - persisted workflow state
//!
//! A session is an explicit struct; the workflow never keeps state anywhere
//! else. Every field downstream of the context carries the key it was
//! computed for so stale results can be detected after a context change.

use serde::{Deserialize, Serialize};

use super::alternative::AlternativeOption;
use super::decision::{DecisionRecord, SuitabilityDecision, Verdict};
use super::id::generate_session_id;
use super::itinerary::{ItineraryResult, TravelOptions};
use super::now_ms;
use super::trip::{TripContext, WeatherSnapshot};

/// Workflow step
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Step 1: waiting for trip details
    #[default]
    CollectInput,
    /// Step 2: weather fetched and judged, alternatives offered
    AnalyzeWeather,
    /// Step 3: travel options fetched and itinerary composed
    BuildItinerary,
}

impl Step {
    pub fn number(&self) -> u8 {
        match self {
            Self::CollectInput => 1,
            Self::AnalyzeWeather => 2,
            Self::BuildItinerary => 3,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::CollectInput => "Trip details",
            Self::AnalyzeWeather => "Weather analysis",
            Self::BuildItinerary => "Itinerary",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CollectInput => write!(f, "collect_input"),
            Self::AnalyzeWeather => write!(f, "analyze_weather"),
            Self::BuildItinerary => write!(f, "build_itinerary"),
        }
    }
}

/// What the user decided after seeing the weather analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserChoice {
    /// Proceed to the itinerary despite the verdict
    Continue,
    /// Switch to one of the offered alternatives
    Alternative(AlternativeOption),
    /// Go back to step 1 to pick another date
    DifferentDate,
    /// Go back to step 1 to pick another city
    DifferentCity,
    /// Go back to step 1
    Restart,
}

/// A recovered fault worth keeping next to the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub component: String,
    pub message: String,
    pub at: i64,
}

/// Persisted state of one trip-planning conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripSession {
    /// Unique identifier
    pub id: String,

    /// Current step
    pub step: Step,

    /// Validated trip details (kept across a restart as the prior input)
    pub context: Option<TripContext>,

    /// Weather for the current destination
    pub weather: Option<WeatherSnapshot>,

    /// Active suitability decision
    pub decision: Option<DecisionRecord>,

    /// None until the finder has run for the active decision
    pub alternatives: Option<Vec<AlternativeOption>>,

    /// User chose to continue despite a NOT_SUITABLE verdict
    #[serde(default)]
    pub continue_override: bool,

    /// Travel options fetched for step 3
    pub travel_options: Option<TravelOptions>,

    /// Final itinerary
    pub itinerary: Option<ItineraryResult>,

    /// Human-readable description of the most recent fault
    pub last_error: Option<String>,

    /// Recovered faults (fallbacks taken, malformed model output)
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,

    /// Last update timestamp (Unix milliseconds)
    pub updated_at: i64,
}

impl TripSession {
    /// Create a new session at step 1 with a generated ID
    pub fn new() -> Self {
        Self::with_id(generate_session_id(None))
    }

    /// Create a new session at step 1 with a specific ID
    pub fn with_id(id: impl Into<String>) -> Self {
        let now = now_ms();
        Self {
            id: id.into(),
            step: Step::CollectInput,
            context: None,
            weather: None,
            decision: None,
            alternatives: None,
            continue_override: false,
            travel_options: None,
            itinerary: None,
            last_error: None,
            diagnostics: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the timestamp
    pub fn touch(&mut self) {
        self.updated_at = now_ms();
    }

    /// Weather snapshot, if it belongs to the current destination and date
    pub fn current_weather(&self) -> Option<&WeatherSnapshot> {
        let key = self.context.as_ref()?.analysis_key();
        self.weather.as_ref().filter(|w| w.key == key)
    }

    /// Decision, if it belongs to the current destination and date
    pub fn current_decision(&self) -> Option<&SuitabilityDecision> {
        let key = self.context.as_ref()?.analysis_key();
        self.decision.as_ref().filter(|d| d.key == key).map(|d| &d.decision)
    }

    pub fn current_verdict(&self) -> Option<Verdict> {
        self.current_decision().map(|d| d.verdict)
    }

    /// Travel options, if they were fetched for the current route and date
    pub fn current_travel_options(&self) -> Option<&TravelOptions> {
        let key = self.context.as_ref()?.search_key();
        self.travel_options.as_ref().filter(|o| o.key == key)
    }

    /// Itinerary, if it was composed for the current route and date
    pub fn current_itinerary(&self) -> Option<&ItineraryResult> {
        let key = self.context.as_ref()?.search_key();
        self.itinerary.as_ref().filter(|i| i.options.key == key)
    }

    /// The finder still has to run for the active decision
    pub fn needs_alternatives(&self) -> bool {
        self.step == Step::AnalyzeWeather
            && self.current_verdict() == Some(Verdict::NotSuitable)
            && !self.continue_override
            && self.alternatives.is_none()
    }

    /// Step 2 is finished and waiting on the user
    pub fn awaiting_choice(&self) -> bool {
        self.step == Step::AnalyzeWeather
            && self.current_verdict() == Some(Verdict::NotSuitable)
            && !self.continue_override
            && self.alternatives.is_some()
    }

    /// Clear everything computed from the context
    pub fn clear_downstream(&mut self) {
        self.weather = None;
        self.decision = None;
        self.alternatives = None;
        self.continue_override = false;
        self.travel_options = None;
        self.itinerary = None;
    }

    pub fn push_diagnostic(&mut self, component: impl Into<String>, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            component: component.into(),
            message: message.into(),
            at: now_ms(),
        });
    }
}

impl Default for TripSession {
    fn default() -> Self {
        Self::new()
    }
}
