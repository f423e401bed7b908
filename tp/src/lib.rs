//! tripplanner - weather-aware trip planning workflow
//!
//! A three-step workflow: collect trip details, judge the destination's
//! weather (offering alternatives when it is unsuitable), then fetch travel
//! options and compose a day-by-day itinerary.
//!
//! # Modules
//!
//! - [`domain`] - Trip context, decisions, travel options and the session record
//! - [`workflow`] - Pure state transitions and the engine that runs their effects
//! - [`agents`] - Suitability judge, alternative finder and itinerary composer
//! - [`llm`] - LLM client trait and provider implementations
//! - [`providers`] - Weather and travel search adapters
//! - [`state`] / [`store`] - Session persistence behind an actor
//! - [`config`] - Configuration types and loading
//! - [`cli`] / [`interactive`] / [`report`] - Command-line front ends

pub mod agents;
pub mod cli;
pub mod config;
pub mod domain;
pub mod interactive;
pub mod llm;
pub mod prompts;
pub mod providers;
pub mod report;
pub mod state;
pub mod store;
pub mod workflow;

// Re-export commonly used types
pub use config::{Config, JudgeFallback, LlmConfig, WorkflowConfig};
pub use domain::{
    AlternativeOption, DecisionRecord, Step, SuitabilityDecision, TravelOptions, TripContext, TripInput, TripSession,
    UserChoice, Verdict,
};
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, create_client};
pub use providers::{ProviderError, SearchProvider, WeatherProvider};
pub use state::{StateError, StateManager};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
pub use workflow::{Effect, WorkflowEngine, WorkflowError};
