//! State management with actor pattern
//!
//! StateManager owns the SessionStore and processes messages via channels,
//! providing serialized access to persisted sessions.

mod manager;
mod messages;

pub use manager::StateManager;
pub use messages::{StateCommand, StateError, StateResponse};
