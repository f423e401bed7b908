//! State manager messages
//!
//! Commands and responses for the actor pattern.

use thiserror::Error;
use tokio::sync::oneshot;

use crate::domain::TripSession;

/// Errors from state operations
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Channel error")]
    ChannelError,
}

/// Response from state operations
pub type StateResponse<T> = Result<T, StateError>;

/// Commands sent to the StateManager actor
#[derive(Debug)]
pub enum StateCommand {
    GetSession {
        id: String,
        reply: oneshot::Sender<StateResponse<Option<TripSession>>>,
    },
    PutSession {
        session: Box<TripSession>,
        reply: oneshot::Sender<StateResponse<()>>,
    },
    ClearSession {
        id: String,
        reply: oneshot::Sender<StateResponse<bool>>,
    },
    ListSessions {
        reply: oneshot::Sender<StateResponse<Vec<TripSession>>>,
    },

    // Shutdown
    Shutdown,
}
