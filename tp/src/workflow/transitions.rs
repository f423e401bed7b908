//! Pure workflow transitions
//!
//! Every function here takes the session by `&mut`, performs no I/O, and
//! either applies a complete transition or leaves the session untouched.
//! `next_effect` tells the engine which side effect the session still needs.

use thiserror::Error;
use tracing::debug;

use crate::domain::{
    AlternativeOption, DecisionRecord, ItineraryResult, Step, TravelOptions, TripInput, TripSession, UserChoice,
    ValidationError, Verdict, WeatherSnapshot,
};

/// A transition the current session state does not allow
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Cannot {action} during step {} ({})", .step.number(), .step.title())]
    WrongStep { action: &'static str, step: Step },

    #[error("No weather decision is available yet")]
    NoDecision,

    #[error("Alternatives are only offered when the weather is not suitable")]
    AlternativesNotOffered,

    #[error("'{0}' is not one of the offered alternatives")]
    UnknownAlternative(String),
}

/// Side effect the engine must perform next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Fetch weather for the current destination
    FetchWeather,
    /// Ask the judge about the current weather
    Judge,
    /// Ask the finder for alternatives to the rejected destination
    FindAlternatives,
    /// Pause, then move a SUITABLE analysis on to step 3
    AutoAdvance,
    /// Fetch flights, hotels and attractions
    FetchTravelOptions,
    /// Ask the composer for the itinerary
    ComposeItinerary,
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::FetchWeather => "fetch_weather",
            Self::Judge => "judge",
            Self::FindAlternatives => "find_alternatives",
            Self::AutoAdvance => "auto_advance",
            Self::FetchTravelOptions => "fetch_travel_options",
            Self::ComposeItinerary => "compose_itinerary",
        };
        write!(f, "{}", name)
    }
}

fn require_step(session: &TripSession, step: Step, action: &'static str) -> Result<(), TransitionError> {
    if session.step != step {
        return Err(TransitionError::WrongStep {
            action,
            step: session.step,
        });
    }
    Ok(())
}

/// What the session still needs, or `None` when it is waiting on the user
pub fn next_effect(session: &TripSession) -> Option<Effect> {
    session.context.as_ref()?;
    match session.step {
        Step::CollectInput => None,
        Step::AnalyzeWeather => {
            if session.current_weather().is_none() {
                Some(Effect::FetchWeather)
            } else if session.current_decision().is_none() {
                Some(Effect::Judge)
            } else if session.current_verdict() == Some(Verdict::Suitable) {
                Some(Effect::AutoAdvance)
            } else if session.needs_alternatives() {
                Some(Effect::FindAlternatives)
            } else {
                None
            }
        }
        Step::BuildItinerary => {
            if session.current_itinerary().is_some() {
                None
            } else if session.current_travel_options().is_none() {
                Some(Effect::FetchTravelOptions)
            } else {
                Some(Effect::ComposeItinerary)
            }
        }
    }
}

/// Step 1 -> 2: accept validated trip details
pub fn submit_input(session: &mut TripSession, input: &TripInput) -> Result<(), TransitionError> {
    debug!(id = %session.id, "submit_input: called");
    require_step(session, Step::CollectInput, "submit trip details")?;
    let context = input.validate()?;

    session.context = Some(context);
    session.clear_downstream();
    session.last_error = None;
    session.step = Step::AnalyzeWeather;
    Ok(())
}

/// Step 2 -> 2: replace the destination with an offered alternative
pub fn select_alternative(session: &mut TripSession, option: &AlternativeOption) -> Result<(), TransitionError> {
    debug!(id = %session.id, city = %option.city, "select_alternative: called");
    require_step(session, Step::AnalyzeWeather, "choose an alternative")?;
    if session.current_verdict() != Some(Verdict::NotSuitable) {
        return Err(TransitionError::AlternativesNotOffered);
    }
    let offered = session
        .alternatives
        .as_ref()
        .is_some_and(|alts| alts.iter().any(|a| a.city == option.city));
    if !offered {
        return Err(TransitionError::UnknownAlternative(option.city.clone()));
    }

    if let Some(context) = session.context.take() {
        session.context = Some(context.with_destination(option.city.clone()));
    }
    session.clear_downstream();
    session.last_error = None;
    Ok(())
}

/// Step 2 -> 3: proceed despite the verdict
pub fn continue_anyway(session: &mut TripSession) -> Result<(), TransitionError> {
    debug!(id = %session.id, "continue_anyway: called");
    require_step(session, Step::AnalyzeWeather, "continue to the itinerary")?;
    if session.current_decision().is_none() {
        return Err(TransitionError::NoDecision);
    }

    session.continue_override = true;
    session.alternatives = None;
    session.last_error = None;
    session.step = Step::BuildItinerary;
    Ok(())
}

/// Step 2 -> 3: automatic edge for a SUITABLE verdict
pub fn advance(session: &mut TripSession) -> Result<(), TransitionError> {
    debug!(id = %session.id, "advance: called");
    require_step(session, Step::AnalyzeWeather, "advance to the itinerary")?;
    match session.current_verdict() {
        Some(Verdict::Suitable) => {
            session.step = Step::BuildItinerary;
            Ok(())
        }
        Some(Verdict::NotSuitable) => Err(TransitionError::WrongStep {
            action: "advance without a choice",
            step: session.step,
        }),
        None => Err(TransitionError::NoDecision),
    }
}

/// Any -> 1: start over, keeping the last trip details as the prior input
pub fn restart(session: &mut TripSession) {
    debug!(id = %session.id, step = %session.step, "restart: called");
    session.clear_downstream();
    session.last_error = None;
    session.step = Step::CollectInput;
}

/// 3 -> 1: plan another trip
pub fn plan_another(session: &mut TripSession) -> Result<(), TransitionError> {
    debug!(id = %session.id, "plan_another: called");
    require_step(session, Step::BuildItinerary, "plan another trip")?;
    restart(session);
    Ok(())
}

/// Apply a step 2 user choice
pub fn apply_choice(session: &mut TripSession, choice: &UserChoice) -> Result<(), TransitionError> {
    debug!(id = %session.id, ?choice, "apply_choice: called");
    match choice {
        UserChoice::Continue => continue_anyway(session),
        UserChoice::Alternative(option) => select_alternative(session, option),
        UserChoice::DifferentDate | UserChoice::DifferentCity | UserChoice::Restart => {
            restart(session);
            Ok(())
        }
    }
}

/// Store fetched weather; any decision made on earlier weather is dropped
pub fn record_weather(session: &mut TripSession, weather: WeatherSnapshot) {
    session.weather = Some(weather);
    session.decision = None;
    session.alternatives = None;
}

/// Store a decision, replacing the previous one
pub fn record_decision(session: &mut TripSession, decision: DecisionRecord) {
    session.decision = Some(decision);
    session.alternatives = None;
    session.continue_override = false;
}

pub fn record_alternatives(session: &mut TripSession, alternatives: Vec<AlternativeOption>) {
    session.alternatives = Some(alternatives);
}

pub fn record_travel_options(session: &mut TripSession, options: TravelOptions) {
    session.travel_options = Some(options);
    session.itinerary = None;
}

pub fn record_itinerary(session: &mut TripSession, itinerary: ItineraryResult) {
    session.itinerary = Some(itinerary);
}
