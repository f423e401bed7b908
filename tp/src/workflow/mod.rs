//! Trip planning workflow
//!
//! `transitions` holds the pure state machine over `TripSession`;
//! `engine` performs the weather, model and search calls it asks for and
//! commits each result through the `StateManager`.

mod engine;
pub mod transitions;

pub use engine::{Progress, WorkflowEngine, WorkflowError};
pub use transitions::{Effect, TransitionError, next_effect};
