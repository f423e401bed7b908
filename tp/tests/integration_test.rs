//! Integration tests for the trip planner
//!
//! These drive the full workflow through the public engine API with
//! scripted model, weather and search backends.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use tempfile::TempDir;

use tripplanner::agents::{AgentContext, AgentSettings};
use tripplanner::config::{JudgeFallback, WorkflowConfig};
use tripplanner::domain::{AttractionOption, FlightOption, HotelOption, Step, TripInput, UserChoice, Verdict};
use tripplanner::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError};
use tripplanner::prompts::PromptLoader;
use tripplanner::providers::{ProviderError, SearchProvider, WeatherProvider};
use tripplanner::state::StateManager;
use tripplanner::workflow::WorkflowEngine;

// =============================================================================
// Scripted backends
// =============================================================================

const SUITABLE: &str = r#"{"decision":"SUITABLE","reasoning":"Warm and dry","concerns":[],"recommendation":"Enjoy the trip"}"#;
const UNSUITABLE: &str = r#"{"decision":"NOT_SUITABLE","reasoning":"Heatwave above 40°C","concerns":["heat"],"recommendation":"Go somewhere cooler"}"#;
const ALTERNATIVES: &str = r#"```json
{"alternatives": [
  {"city": "Amsterdam", "reason": "Canals", "expected_weather": "22°C, cloudy"},
  {"city": "Lisbon", "reason": "Coastal breeze", "expected_weather": "26°C, sunny"},
  {"city": "Edinburgh", "reason": "Festivals", "expected_weather": "18°C, showers"}
]}
```"#;

/// Answers by prompt kind; judge answers are looked up by destination
struct ScriptedLlm {
    verdicts: HashMap<&'static str, &'static str>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    fn new(verdicts: &[(&'static str, &'static str)]) -> Self {
        Self {
            verdicts: verdicts.iter().copied().collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self, kind: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.as_str() == kind).count()
    }

    fn record(&self, kind: &str) {
        self.calls.lock().unwrap().push(kind.to_string());
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let prompt = request.messages[0].content.clone();

        if prompt.contains("alternative destinations with better weather") {
            self.record("finder");
            return Ok(CompletionResponse::text(ALTERNATIVES));
        }
        if prompt.contains("day-wise itinerary") {
            self.record("composer");
            return Ok(CompletionResponse::text("Day 1: Arrive\n\n\n\nDay 2: Explore\n"));
        }

        self.record("judge");
        let answer = self
            .verdicts
            .iter()
            .find(|(city, _)| prompt.contains(&format!("Weather Data for {} on", city)))
            .map(|(_, answer)| *answer);
        match answer {
            Some("FAIL") | None => Err(LlmError::ApiError {
                status: 503,
                message: "connection reset".to_string(),
            }),
            Some(answer) => Ok(CompletionResponse::text(answer)),
        }
    }
}

#[derive(Default)]
struct FakeWeather {
    queries: Mutex<Vec<String>>,
}

#[async_trait]
impl WeatherProvider for FakeWeather {
    async fn fetch(&self, query: &str) -> Result<String, ProviderError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(format!(
            "In {}, the current weather is as follows:\nDetailed status: clear sky\nTemperature (°C): 24",
            query
        ))
    }
}

#[derive(Default)]
struct FakeSearch {
    calls: AtomicUsize,
}

#[async_trait]
impl SearchProvider for FakeSearch {
    async fn flights(
        &self,
        _origin: &str,
        _destination: &str,
        _date: NaiveDate,
    ) -> Result<Vec<FlightOption>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![FlightOption {
            airline: "Air India".to_string(),
            duration: "9h 30m".to_string(),
            kind: "Nonstop".to_string(),
            price: "$850".to_string(),
        }])
    }

    async fn hotels(&self, location: &str) -> Result<Vec<HotelOption>, ProviderError> {
        Ok(vec![HotelOption {
            name: format!("Hotel {}", location),
            price: "$180".to_string(),
            rating: Some(4.5),
            image: None,
        }])
    }

    async fn attractions(&self, location: &str) -> Result<Vec<AttractionOption>, ProviderError> {
        Ok(vec![AttractionOption {
            place: format!("{} Old Town", location),
            description: "Historic center".to_string(),
            rating: Some(4.8),
            thumbnail: None,
        }])
    }
}

struct Fixture {
    engine: WorkflowEngine,
    llm: Arc<ScriptedLlm>,
    weather: Arc<FakeWeather>,
    search: Arc<FakeSearch>,
}

fn fixture(verdicts: &[(&'static str, &'static str)], state: StateManager, config: WorkflowConfig) -> Fixture {
    let llm = Arc::new(ScriptedLlm::new(verdicts));
    let weather = Arc::new(FakeWeather::default());
    let search = Arc::new(FakeSearch::default());
    let agents = AgentContext::new(llm.clone(), Arc::new(PromptLoader::embedded_only()), AgentSettings::default());
    let engine = WorkflowEngine::new(agents, weather.clone(), search.clone(), state, &config);
    Fixture {
        engine,
        llm,
        weather,
        search,
    }
}

fn quick_config() -> WorkflowConfig {
    WorkflowConfig {
        auto_advance_delay_ms: 0,
        ..Default::default()
    }
}

fn mumbai_to_paris() -> TripInput {
    TripInput::new("Mumbai", "Paris", NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(), 5)
}

// =============================================================================
// End-to-end scenarios
// =============================================================================

#[tokio::test]
async fn test_suitable_weather_advances_to_itinerary() {
    let config = WorkflowConfig {
        auto_advance_delay_ms: 50,
        ..Default::default()
    };
    let f = fixture(&[("Paris", SUITABLE)], StateManager::in_memory(), config);

    let started = Instant::now();
    let session = f.engine.start(&mumbai_to_paris(), None).await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(50), "grace period honored");

    assert_eq!(session.step, Step::BuildItinerary);
    assert_eq!(session.current_verdict(), Some(Verdict::Suitable));
    assert!(session.alternatives.is_none());
    let itinerary = session.current_itinerary().expect("itinerary composed");
    assert_eq!(itinerary.text, "Day 1: Arrive\n\nDay 2: Explore");
    assert_eq!(itinerary.options.hotels[0].name, "Hotel Paris");

    assert_eq!(f.llm.calls("judge"), 1);
    assert_eq!(f.llm.calls("finder"), 0);
    assert_eq!(f.llm.calls("composer"), 1);
    assert_eq!(f.search.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unsuitable_weather_then_pick_second_alternative() {
    let f = fixture(
        &[("Paris", UNSUITABLE), ("Lisbon", SUITABLE)],
        StateManager::in_memory(),
        quick_config(),
    );

    let session = f.engine.start(&mumbai_to_paris(), None).await.unwrap();
    assert_eq!(session.step, Step::AnalyzeWeather);
    assert!(session.awaiting_choice());
    let alternatives = session.alternatives.clone().unwrap();
    assert_eq!(alternatives.len(), 3);
    assert_eq!(alternatives[1].city, "Lisbon");

    let session = f
        .engine
        .choose(&session.id, &UserChoice::Alternative(alternatives[1].clone()))
        .await
        .unwrap();

    let context = session.context.as_ref().unwrap();
    assert_eq!(context.destination_city, "Lisbon");
    assert_eq!(context.starting_city, "Mumbai");
    assert_eq!(session.current_verdict(), Some(Verdict::Suitable));
    assert!(session.alternatives.is_none(), "no stale alternatives from round 1");
    assert_eq!(session.step, Step::BuildItinerary);
    assert_eq!(session.current_itinerary().unwrap().options.key.destination, "Lisbon");

    assert_eq!(*f.weather.queries.lock().unwrap(), vec!["Paris", "Lisbon"]);
    assert_eq!(f.llm.calls("judge"), 2);
    assert_eq!(f.llm.calls("finder"), 1);
}

#[tokio::test]
async fn test_judge_network_fault_falls_back_to_suitable() {
    let f = fixture(&[("Paris", "FAIL")], StateManager::in_memory(), quick_config());

    let session = f.engine.start(&mumbai_to_paris(), None).await.unwrap();
    let decision = session.current_decision().unwrap();
    assert_eq!(decision.verdict, Verdict::Suitable);
    assert_eq!(decision.reasoning, "Unable to analyze weather, proceeding with caution");
    assert!(decision.concerns.is_empty());
    assert_eq!(decision.recommendation, "Review weather data manually");

    assert!(session.decision.as_ref().unwrap().fallback);
    assert_eq!(session.diagnostics.len(), 1);
    assert_eq!(session.diagnostics[0].component, "judge");
    assert_eq!(session.step, Step::BuildItinerary);
}

#[tokio::test]
async fn test_judge_fault_fail_closed_offers_alternatives() {
    let config = WorkflowConfig {
        judge_fallback: JudgeFallback::NotSuitable,
        ..quick_config()
    };
    let f = fixture(&[("Paris", "FAIL")], StateManager::in_memory(), config);

    let session = f.engine.start(&mumbai_to_paris(), None).await.unwrap();
    assert_eq!(session.current_verdict(), Some(Verdict::NotSuitable));
    assert!(session.awaiting_choice());
    assert_eq!(session.alternatives.as_ref().unwrap().len(), 3);
}

// =============================================================================
// Persistence and resume
// =============================================================================

#[tokio::test]
async fn test_sessions_survive_restart_of_the_store() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let id = {
        let state = StateManager::spawn(temp_dir.path()).unwrap();
        let f = fixture(&[("Paris", UNSUITABLE)], state.clone(), quick_config());
        let session = f
            .engine
            .start(&mumbai_to_paris(), Some("mumbai-paris".to_string()))
            .await
            .unwrap();
        state.shutdown().await.unwrap();
        session.id
    };

    let state = StateManager::spawn(temp_dir.path()).unwrap();
    let f = fixture(&[("Paris", UNSUITABLE)], state, quick_config());
    let session = f.engine.resume(&id).await.unwrap();

    assert!(session.awaiting_choice());
    assert_eq!(f.llm.calls("judge"), 0, "committed decision reused");
    assert_eq!(f.llm.calls("finder"), 0, "committed alternatives reused");
    assert!(f.weather.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_different_date_returns_to_step_one_and_restarts_cleanly() {
    let f = fixture(&[("Paris", UNSUITABLE)], StateManager::in_memory(), quick_config());
    let session = f.engine.start(&mumbai_to_paris(), None).await.unwrap();

    let session = f.engine.choose(&session.id, &UserChoice::DifferentDate).await.unwrap();
    assert_eq!(session.step, Step::CollectInput);
    assert!(session.decision.is_none());
    assert_eq!(session.context.as_ref().unwrap().destination_city, "Paris");

    let later = TripInput::new("Mumbai", "Paris", NaiveDate::from_ymd_opt(2025, 10, 15).unwrap(), 5);
    let session = f.engine.submit(&session.id, &later).await.unwrap();
    assert_eq!(session.step, Step::AnalyzeWeather);
    assert_eq!(
        session.current_weather().unwrap().key.travel_date,
        NaiveDate::from_ymd_opt(2025, 10, 15).unwrap()
    );
    assert_eq!(f.llm.calls("judge"), 2);
}

#[tokio::test]
async fn test_list_and_clear_sessions() {
    let f = fixture(&[("Paris", SUITABLE)], StateManager::in_memory(), quick_config());
    let first = f.engine.start(&mumbai_to_paris(), None).await.unwrap();
    let second = f.engine.create_session(None).await.unwrap();

    let sessions = f.engine.list().await.unwrap();
    assert_eq!(sessions.len(), 2);

    assert!(f.engine.clear(&first.id).await.unwrap());
    assert!(!f.engine.clear(&first.id).await.unwrap());
    let sessions = f.engine.list().await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, second.id);
}
