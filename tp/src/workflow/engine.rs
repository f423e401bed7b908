//! WorkflowEngine - runs side effects for the pure transitions
//!
//! The engine loads a session, asks `next_effect` what is missing, performs
//! that one effect and commits the session before looking again. A session
//! that was interrupted is picked up by `resume` without repeating any call
//! whose result was already committed.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::agents::{AgentContext, AgentError, AlternativeFinder, ItineraryComposer, SuitabilityJudge};
use crate::config::{JudgeFallback, WorkflowConfig};
use crate::domain::{
    DecisionRecord, ItineraryResult, Step, TravelOptions, TripContext, TripInput, TripSession, UserChoice, Verdict,
    WeatherSnapshot, generate_session_id, is_valid_session_id,
};
use crate::providers::{ProviderError, SearchProvider, WeatherProvider};
use crate::state::{StateError, StateManager};

use super::transitions::{self, Effect, TransitionError};

/// Errors surfaced to the caller of a workflow operation
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Invalid session id: '{0}'")]
    InvalidSessionId(String),

    #[error("Session has no trip details")]
    MissingContext,

    #[error("Weather lookup failed: {0}")]
    Weather(ProviderError),

    #[error("Travel search failed: {0}")]
    Search(ProviderError),

    #[error("Itinerary generation failed: {0}")]
    Composer(AgentError),

    #[error(transparent)]
    State(#[from] StateError),
}

impl WorkflowError {
    /// Retrying the same operation later may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Weather(e) | Self::Search(e) => !matches!(e, ProviderError::Config(_) | ProviderError::NotFound(_)),
            Self::Composer(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// The session after one engine step, and the effect that step performed
#[derive(Debug, Clone)]
pub struct Progress {
    pub session: TripSession,
    pub effect: Option<Effect>,
}

/// Drives trip sessions through weather analysis and itinerary building
pub struct WorkflowEngine {
    judge: SuitabilityJudge,
    finder: AlternativeFinder,
    composer: ItineraryComposer,
    weather: Arc<dyn WeatherProvider>,
    search: Arc<dyn SearchProvider>,
    state: StateManager,
    auto_advance_delay: Duration,
    call_timeout: Duration,
}

impl WorkflowEngine {
    pub fn new(
        agents: AgentContext,
        weather: Arc<dyn WeatherProvider>,
        search: Arc<dyn SearchProvider>,
        state: StateManager,
        config: &WorkflowConfig,
    ) -> Self {
        debug!(?config, "WorkflowEngine::new: called");
        let fallback = match config.judge_fallback {
            JudgeFallback::Suitable => Verdict::Suitable,
            JudgeFallback::NotSuitable => Verdict::NotSuitable,
        };
        Self {
            judge: SuitabilityJudge::new(agents.clone(), fallback),
            finder: AlternativeFinder::new(agents.clone(), config.max_alternatives),
            composer: ItineraryComposer::new(agents),
            weather,
            search,
            state,
            auto_advance_delay: config.auto_advance_delay(),
            call_timeout: config.call_timeout(),
        }
    }

    /// Override the pause before a SUITABLE session moves to step 3
    pub fn with_auto_advance_delay(mut self, delay: Duration) -> Self {
        self.auto_advance_delay = delay;
        self
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Create and persist an empty session at step 1
    pub async fn create_session(&self, id: Option<String>) -> Result<TripSession, WorkflowError> {
        debug!(?id, "create_session: called");
        let mut session = match id {
            Some(id) => TripSession::with_id(checked_id(&id)?),
            None => TripSession::new(),
        };
        self.commit(&mut session).await?;
        Ok(session)
    }

    /// Submit trip details and run the workflow until it needs the user
    ///
    /// With an `id`, an existing session is restarted and reused; otherwise a
    /// new session is created with an id slugged from the destination.
    pub async fn start(&self, input: &TripInput, id: Option<String>) -> Result<TripSession, WorkflowError> {
        debug!(?id, destination = %input.destination_city, "start: called");
        let session = match id {
            Some(id) => {
                let id = checked_id(&id)?;
                match self.state.get_session(id).await? {
                    Some(mut existing) => {
                        if existing.step != Step::CollectInput {
                            // a rejected restart leaves the stored session as it was
                            input
                                .validate()
                                .map_err(|e| WorkflowError::from(TransitionError::from(e)))?;
                            transitions::restart(&mut existing);
                        }
                        existing
                    }
                    None => TripSession::with_id(id),
                }
            }
            None => TripSession::with_id(generate_session_id(Some(input.destination_city.trim()))),
        };
        self.submit_to(session, input).await
    }

    /// Submit trip details to a session waiting at step 1
    pub async fn submit(&self, id: &str, input: &TripInput) -> Result<TripSession, WorkflowError> {
        debug!(%id, "submit: called");
        let session = self.load(id).await?;
        self.submit_to(session, input).await
    }

    async fn submit_to(&self, session: TripSession, input: &TripInput) -> Result<TripSession, WorkflowError> {
        let session = self.accept_input(session, input).await?;
        self.drive(session).await
    }

    /// Apply trip details to `session` and commit, without running effects
    pub async fn accept_input(
        &self,
        mut session: TripSession,
        input: &TripInput,
    ) -> Result<TripSession, WorkflowError> {
        if let Err(e) = transitions::submit_input(&mut session, input) {
            return Err(self.fail(session, e.into()).await);
        }
        info!(id = %session.id, "Trip details accepted");
        self.commit(&mut session).await?;
        Ok(session)
    }

    /// Apply the user's step 2 choice and continue
    pub async fn choose(&self, id: &str, choice: &UserChoice) -> Result<TripSession, WorkflowError> {
        debug!(%id, ?choice, "choose: called");
        let session = self.load(id).await?;
        let session = self.accept_choice(session, choice).await?;
        self.drive(session).await
    }

    /// Apply a step 2 choice to `session` and commit, without running effects
    pub async fn accept_choice(
        &self,
        mut session: TripSession,
        choice: &UserChoice,
    ) -> Result<TripSession, WorkflowError> {
        if let Err(e) = transitions::apply_choice(&mut session, choice) {
            return Err(self.fail(session, e.into()).await);
        }
        self.commit(&mut session).await?;
        Ok(session)
    }

    /// Recompute whatever is missing or stale, then stop where the user is needed
    pub async fn resume(&self, id: &str) -> Result<TripSession, WorkflowError> {
        debug!(%id, "resume: called");
        let session = self.load(id).await?;
        info!(id = %session.id, step = %session.step, "Resuming session");
        self.drive(session).await
    }

    /// Leave a finished itinerary and return to step 1
    pub async fn plan_another(&self, id: &str) -> Result<TripSession, WorkflowError> {
        debug!(%id, "plan_another: called");
        let mut session = self.load(id).await?;
        if let Err(e) = transitions::plan_another(&mut session) {
            return Err(self.fail(session, e.into()).await);
        }
        self.commit(&mut session).await?;
        Ok(session)
    }

    pub async fn get(&self, id: &str) -> Result<TripSession, WorkflowError> {
        self.load(id).await
    }

    pub async fn list(&self) -> Result<Vec<TripSession>, WorkflowError> {
        Ok(self.state.list_sessions().await?)
    }

    /// Delete a session; returns whether it existed
    pub async fn clear(&self, id: &str) -> Result<bool, WorkflowError> {
        debug!(%id, "clear: called");
        let id = checked_id(id)?;
        Ok(self.state.clear_session(id).await?)
    }

    /// Run effects until the session waits on the user
    pub async fn drive(&self, session: TripSession) -> Result<TripSession, WorkflowError> {
        self.drive_with(session, |_, _| {}).await
    }

    /// Like `drive`, calling `observer` before each effect starts
    pub async fn drive_with<F>(&self, mut session: TripSession, mut observer: F) -> Result<TripSession, WorkflowError>
    where
        F: FnMut(&TripSession, Effect),
    {
        debug!(id = %session.id, step = %session.step, "drive_with: called");
        while let Some(effect) = transitions::next_effect(&session) {
            observer(&session, effect);
            session = self.step(session).await?.session;
        }
        debug!(id = %session.id, step = %session.step, "drive_with: idle");
        Ok(session)
    }

    /// Perform at most one effect and commit the result
    pub async fn step(&self, mut session: TripSession) -> Result<Progress, WorkflowError> {
        let Some(effect) = transitions::next_effect(&session) else {
            return Ok(Progress { session, effect: None });
        };
        debug!(id = %session.id, %effect, "step: running effect");

        if let Err(e) = self.run(&mut session, effect).await {
            return Err(self.fail(session, e).await);
        }
        session.last_error = None;
        self.commit(&mut session).await?;
        Ok(Progress {
            session,
            effect: Some(effect),
        })
    }

    async fn run(&self, session: &mut TripSession, effect: Effect) -> Result<(), WorkflowError> {
        let context = session.context.clone().ok_or(WorkflowError::MissingContext)?;
        match effect {
            Effect::FetchWeather => {
                let text = self
                    .bounded(self.weather.fetch(&context.destination_city))
                    .await
                    .map_err(WorkflowError::Weather)?;
                info!(id = %session.id, destination = %context.destination_city, "Weather fetched");
                transitions::record_weather(session, WeatherSnapshot::new(context.analysis_key(), text));
            }
            Effect::Judge => {
                let weather = session
                    .current_weather()
                    .map(|w| w.text.clone())
                    .ok_or(WorkflowError::MissingContext)?;
                let outcome = self
                    .judge
                    .judge(&weather, &context.destination_city, context.travel_date)
                    .await;
                let fallback = outcome.is_fallback();
                if let Some(diagnostic) = outcome.diagnostic {
                    session.push_diagnostic("judge", diagnostic);
                }
                transitions::record_decision(
                    session,
                    DecisionRecord::new(context.analysis_key(), outcome.value, fallback),
                );
            }
            Effect::FindAlternatives => {
                let reason = session
                    .current_decision()
                    .map(|d| d.reasoning.clone())
                    .unwrap_or_default();
                let outcome = self
                    .finder
                    .suggest(
                        &context.destination_city,
                        &reason,
                        &context.starting_city,
                        context.travel_date,
                    )
                    .await;
                if let Some(diagnostic) = outcome.diagnostic {
                    session.push_diagnostic("finder", diagnostic);
                }
                transitions::record_alternatives(session, outcome.value);
            }
            Effect::AutoAdvance => {
                if !self.auto_advance_delay.is_zero() {
                    tokio::time::sleep(self.auto_advance_delay).await;
                }
                transitions::advance(session)?;
                info!(id = %session.id, "Weather suitable, building itinerary");
            }
            Effect::FetchTravelOptions => {
                let options = self.fetch_travel_options(&context).await?;
                info!(
                    id = %session.id,
                    flights = options.flights.len(),
                    hotels = options.hotels.len(),
                    attractions = options.attractions.len(),
                    "Travel options fetched"
                );
                transitions::record_travel_options(session, options);
            }
            Effect::ComposeItinerary => {
                let options = session
                    .current_travel_options()
                    .cloned()
                    .ok_or(WorkflowError::MissingContext)?;
                let text = self
                    .composer
                    .compose(&options, context.duration_days, &context.destination_city)
                    .await
                    .map_err(WorkflowError::Composer)?;
                info!(id = %session.id, "Itinerary composed");
                transitions::record_itinerary(session, ItineraryResult::new(text, options));
            }
        }
        Ok(())
    }

    async fn fetch_travel_options(&self, context: &TripContext) -> Result<TravelOptions, WorkflowError> {
        let location = context.destination_city.as_str();
        let (flights, hotels, attractions) = futures::future::try_join3(
            self.bounded(
                self.search
                    .flights(&context.starting_city, location, context.travel_date),
            ),
            self.bounded(self.search.hotels(location)),
            self.bounded(self.search.attractions(location)),
        )
        .await
        .map_err(WorkflowError::Search)?;
        Ok(TravelOptions::new(context.search_key(), flights, hotels, attractions))
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T, ProviderError>>) -> Result<T, ProviderError> {
        tokio::time::timeout(self.call_timeout, call)
            .await
            .map_err(|_| ProviderError::Timeout(self.call_timeout))?
    }

    async fn load(&self, id: &str) -> Result<TripSession, WorkflowError> {
        let id = checked_id(id)?;
        Ok(self.state.get_session_required(id).await?)
    }

    async fn commit(&self, session: &mut TripSession) -> Result<(), WorkflowError> {
        session.touch();
        self.state.put_session(session.clone()).await?;
        Ok(())
    }

    /// Record `error` on the session and persist it; returns the error
    async fn fail(&self, mut session: TripSession, error: WorkflowError) -> WorkflowError {
        warn!(id = %session.id, step = %session.step, %error, "Workflow fault");
        session.last_error = Some(error.to_string());
        if let Err(e) = self.commit(&mut session).await {
            warn!(id = %session.id, error = %e, "fail: could not persist last_error");
        }
        error
    }
}

fn checked_id(id: &str) -> Result<&str, WorkflowError> {
    if is_valid_session_id(id) {
        Ok(id)
    } else {
        Err(WorkflowError::InvalidSessionId(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentSettings;
    use crate::domain::{AlternativeOption, AttractionOption, FlightOption, HotelOption, ValidationError};
    use crate::llm::client::mock::MockLlmClient;
    use crate::prompts::PromptLoader;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const UNSUITABLE: &str = r#"{"decision":"NOT_SUITABLE","reasoning":"Blizzard","concerns":["snow"],"recommendation":"Reconsider"}"#;
    const SUITABLE: &str = r#"{"decision":"SUITABLE","reasoning":"Mild","concerns":[],"recommendation":"Go"}"#;
    const ALTERNATIVES: &str = r#"{"alternatives":[{"city":"Miami","reason":"warm","expected_weather":"28°C"}]}"#;

    #[derive(Default)]
    struct StubWeather {
        calls: AtomicUsize,
        failures: AtomicUsize,
    }

    #[async_trait]
    impl WeatherProvider for StubWeather {
        async fn fetch(&self, query: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(ProviderError::Api {
                    status: 503,
                    message: "unavailable".to_string(),
                });
            }
            Ok(format!("In {}, the current weather is as follows:", query))
        }
    }

    #[derive(Default)]
    struct StubSearch {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SearchProvider for StubSearch {
        async fn flights(&self, _: &str, _: &str, _: NaiveDate) -> Result<Vec<FlightOption>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![FlightOption::not_available()])
        }

        async fn hotels(&self, location: &str) -> Result<Vec<HotelOption>, ProviderError> {
            Ok(vec![HotelOption {
                name: format!("{} Inn", location),
                price: "$120".to_string(),
                rating: Some(4.2),
                image: None,
            }])
        }

        async fn attractions(&self, _: &str) -> Result<Vec<AttractionOption>, ProviderError> {
            Ok(Vec::new())
        }
    }

    struct Harness {
        engine: WorkflowEngine,
        llm: Arc<MockLlmClient>,
        weather: Arc<StubWeather>,
        search: Arc<StubSearch>,
    }

    fn harness(responses: Vec<&str>) -> Harness {
        let llm = Arc::new(MockLlmClient::new(responses));
        let weather = Arc::new(StubWeather::default());
        let search = Arc::new(StubSearch::default());
        let agents = AgentContext::new(llm.clone(), Arc::new(PromptLoader::embedded_only()), AgentSettings::default());
        let engine = WorkflowEngine::new(
            agents,
            weather.clone(),
            search.clone(),
            StateManager::in_memory(),
            &WorkflowConfig::default(),
        )
        .with_auto_advance_delay(Duration::ZERO);
        Harness {
            engine,
            llm,
            weather,
            search,
        }
    }

    fn input(to: &str) -> TripInput {
        TripInput::new("Austin", to, NaiveDate::from_ymd_opt(2026, 12, 20).unwrap(), 3)
    }

    #[tokio::test]
    async fn test_suitable_trip_runs_to_itinerary() {
        let h = harness(vec![SUITABLE, "Day 1: Museums\n\n\n\nDay 2: Park"]);
        let session = h.engine.start(&input("Lisbon"), None).await.unwrap();

        assert_eq!(session.step, Step::BuildItinerary);
        assert!(session.id.ends_with("-trip-lisbon"));
        let itinerary = session.current_itinerary().unwrap();
        assert_eq!(itinerary.text, "Day 1: Museums\n\nDay 2: Park");
        assert_eq!(h.llm.call_count(), 2);
        assert!(session.last_error.is_none());

        let stored = h.engine.get(&session.id).await.unwrap();
        assert_eq!(stored, session);
    }

    #[tokio::test]
    async fn test_unsuitable_trip_waits_with_alternatives() {
        let h = harness(vec![UNSUITABLE, ALTERNATIVES]);
        let session = h.engine.start(&input("Chicago"), None).await.unwrap();

        assert_eq!(session.step, Step::AnalyzeWeather);
        assert!(session.awaiting_choice());
        assert_eq!(session.alternatives.as_ref().unwrap()[0].city, "Miami");
        assert!(h.llm.prompts()[1].contains("Blizzard"));
    }

    #[tokio::test]
    async fn test_choose_alternative_reanalyzes_new_destination() {
        let h = harness(vec![UNSUITABLE, ALTERNATIVES, SUITABLE, "Beach day"]);
        let session = h.engine.start(&input("Chicago"), None).await.unwrap();

        let miami = AlternativeOption::new("Miami", "warm", "28°C");
        let session = h
            .engine
            .choose(&session.id, &UserChoice::Alternative(miami))
            .await
            .unwrap();

        assert_eq!(session.step, Step::BuildItinerary);
        assert_eq!(session.context.as_ref().unwrap().destination_city, "Miami");
        assert_eq!(h.weather.calls.load(Ordering::SeqCst), 2);
        assert_eq!(session.current_itinerary().unwrap().text, "Beach day");
    }

    #[tokio::test]
    async fn test_continue_anyway_builds_itinerary() {
        let h = harness(vec![UNSUITABLE, ALTERNATIVES, "Indoor plan"]);
        let session = h.engine.start(&input("Chicago"), None).await.unwrap();
        let session = h.engine.choose(&session.id, &UserChoice::Continue).await.unwrap();

        assert_eq!(session.step, Step::BuildItinerary);
        assert!(session.continue_override);
        assert_eq!(session.current_itinerary().unwrap().text, "Indoor plan");
    }

    #[tokio::test]
    async fn test_weather_fault_is_recorded_and_resume_retries() {
        let h = harness(vec![UNSUITABLE, ALTERNATIVES]);
        h.weather.failures.store(1, Ordering::SeqCst);

        let err = h.engine.start(&input("Chicago"), Some("chi".to_string())).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Weather(_)));
        assert!(err.is_transient());

        let stored = h.engine.get("chi").await.unwrap();
        assert_eq!(stored.step, Step::AnalyzeWeather);
        assert!(stored.last_error.as_deref().unwrap().contains("Weather lookup failed"));
        assert_eq!(h.llm.call_count(), 0);

        let session = h.engine.resume("chi").await.unwrap();
        assert!(session.awaiting_choice());
        assert!(session.last_error.is_none());
    }

    #[tokio::test]
    async fn test_resume_does_not_repeat_committed_calls() {
        let h = harness(vec![UNSUITABLE, ALTERNATIVES]);
        let session = h.engine.start(&input("Chicago"), None).await.unwrap();

        let resumed = h.engine.resume(&session.id).await.unwrap();
        assert_eq!(resumed.alternatives, session.alternatives);
        assert_eq!(h.llm.call_count(), 2);
        assert_eq!(h.weather.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_composer_fault_keeps_travel_options() {
        let h = harness(vec![SUITABLE]);
        let err = h.engine.start(&input("Lisbon"), Some("lis".to_string())).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Composer(_)));

        let stored = h.engine.get("lis").await.unwrap();
        assert_eq!(stored.step, Step::BuildItinerary);
        assert!(stored.current_travel_options().is_some());
        assert!(stored.itinerary.is_none());
        assert_eq!(h.search.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_validation_fault_stays_at_step_one() {
        let h = harness(vec![]);
        let err = h.engine.start(&input("  "), Some("blank".to_string())).await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Transition(TransitionError::Validation(ValidationError::MissingDestination))
        ));
        let stored = h.engine.get("blank").await.unwrap();
        assert_eq!(stored.step, Step::CollectInput);
        assert!(stored.last_error.is_some());
    }

    #[tokio::test]
    async fn test_invalid_restart_keeps_finished_session() {
        let h = harness(vec![SUITABLE, "Day 1: Alfama"]);
        let finished = h.engine.start(&input("Lisbon"), Some("keep".to_string())).await.unwrap();
        assert_eq!(finished.step, Step::BuildItinerary);

        let err = h.engine.start(&input("   "), Some("keep".to_string())).await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Transition(TransitionError::Validation(ValidationError::MissingDestination))
        ));

        let stored = h.engine.get("keep").await.unwrap();
        assert_eq!(stored, finished);
        assert_eq!(stored.current_itinerary().unwrap().text, "Day 1: Alfama");
        assert!(stored.weather.is_some());
        assert_eq!(h.llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_plan_another_returns_to_step_one() {
        let h = harness(vec![SUITABLE, "Plan"]);
        let session = h.engine.start(&input("Lisbon"), None).await.unwrap();
        let session = h.engine.plan_another(&session.id).await.unwrap();
        assert_eq!(session.step, Step::CollectInput);
        assert!(session.itinerary.is_none());
        assert!(session.weather.is_none());
    }

    #[tokio::test]
    async fn test_invalid_session_id_rejected() {
        let h = harness(vec![]);
        assert!(matches!(
            h.engine.resume("../etc").await,
            Err(WorkflowError::InvalidSessionId(_))
        ));
        assert!(matches!(
            h.engine.resume("missing").await,
            Err(WorkflowError::State(StateError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_drive_with_reports_effects_in_order() {
        let h = harness(vec![UNSUITABLE, ALTERNATIVES]);
        let mut session = h.engine.create_session(Some("obs".to_string())).await.unwrap();
        transitions::submit_input(&mut session, &input("Chicago")).unwrap();

        let mut seen = Vec::new();
        h.engine
            .drive_with(session, |_, effect| seen.push(effect))
            .await
            .unwrap();
        assert_eq!(seen, vec![Effect::FetchWeather, Effect::Judge, Effect::FindAlternatives]);
    }
}
