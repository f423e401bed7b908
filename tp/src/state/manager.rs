//! StateManager - actor that owns the SessionStore
//!
//! Processes commands via channels so every write to the store is serialized.

use std::path::Path;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::domain::TripSession;
use crate::store::{FileSessionStore, MemorySessionStore, SessionStore};

use super::messages::{StateCommand, StateError, StateResponse};

/// Handle to send commands to the StateManager
#[derive(Clone)]
pub struct StateManager {
    tx: mpsc::Sender<StateCommand>,
}

impl StateManager {
    /// Spawn a StateManager backed by JSON files in `sessions_dir`
    pub fn spawn(sessions_dir: impl AsRef<Path>) -> eyre::Result<Self> {
        debug!(sessions_dir = %sessions_dir.as_ref().display(), "spawn: called");
        let store = FileSessionStore::open(sessions_dir.as_ref())?;
        Ok(Self::with_store(Box::new(store)))
    }

    /// Spawn a StateManager that keeps sessions in memory
    pub fn in_memory() -> Self {
        debug!("in_memory: called");
        Self::with_store(Box::new(MemorySessionStore::new()))
    }

    /// Spawn a StateManager over any store backend
    pub fn with_store(store: Box<dyn SessionStore>) -> Self {
        let (tx, rx) = mpsc::channel(256);

        // Spawn the actor task
        tokio::spawn(actor_loop(store, rx));

        info!("StateManager spawned");
        Self { tx }
    }

    /// Get a session by ID
    pub async fn get_session(&self, id: &str) -> StateResponse<Option<TripSession>> {
        debug!(%id, "get_session: called");
        let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
        self.tx
            .send(StateCommand::GetSession {
                id: id.to_string(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| StateError::ChannelError)?;
        reply_rx.await.map_err(|_| StateError::ChannelError)?
    }

    /// Get a session by ID, returning error if not found
    pub async fn get_session_required(&self, id: &str) -> StateResponse<TripSession> {
        debug!(%id, "get_session_required: called");
        self.get_session(id)
            .await?
            .ok_or_else(|| StateError::NotFound(id.to_string()))
    }

    /// Insert or replace a session
    pub async fn put_session(&self, session: TripSession) -> StateResponse<()> {
        debug!(id = %session.id, step = %session.step, "put_session: called");
        let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
        self.tx
            .send(StateCommand::PutSession {
                session: Box::new(session),
                reply: reply_tx,
            })
            .await
            .map_err(|_| StateError::ChannelError)?;
        reply_rx.await.map_err(|_| StateError::ChannelError)?
    }

    /// Delete a session; returns whether it existed
    pub async fn clear_session(&self, id: &str) -> StateResponse<bool> {
        debug!(%id, "clear_session: called");
        let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
        self.tx
            .send(StateCommand::ClearSession {
                id: id.to_string(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| StateError::ChannelError)?;
        reply_rx.await.map_err(|_| StateError::ChannelError)?
    }

    /// List sessions, most recently updated first
    pub async fn list_sessions(&self) -> StateResponse<Vec<TripSession>> {
        debug!("list_sessions: called");
        let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
        self.tx
            .send(StateCommand::ListSessions { reply: reply_tx })
            .await
            .map_err(|_| StateError::ChannelError)?;
        reply_rx.await.map_err(|_| StateError::ChannelError)?
    }

    /// Shutdown the StateManager
    pub async fn shutdown(&self) -> Result<(), StateError> {
        debug!("shutdown: called");
        self.tx
            .send(StateCommand::Shutdown)
            .await
            .map_err(|_| StateError::ChannelError)
    }
}

/// The actor loop that owns the store and processes commands
async fn actor_loop(mut store: Box<dyn SessionStore>, mut rx: mpsc::Receiver<StateCommand>) {
    debug!("StateManager actor started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            StateCommand::GetSession { id, reply } => {
                debug!(%id, "actor_loop: GetSession command");
                let result = store.get(&id).map_err(|e| StateError::StoreError(e.to_string()));
                let _ = reply.send(result);
            }

            StateCommand::PutSession { session, reply } => {
                debug!(id = %session.id, "actor_loop: PutSession command");
                let result = store.put(&session).map_err(|e| StateError::StoreError(e.to_string()));
                let _ = reply.send(result);
            }

            StateCommand::ClearSession { id, reply } => {
                debug!(%id, "actor_loop: ClearSession command");
                let result = store.clear(&id).map_err(|e| StateError::StoreError(e.to_string()));
                let _ = reply.send(result);
            }

            StateCommand::ListSessions { reply } => {
                debug!("actor_loop: ListSessions command");
                let result = store.list().map_err(|e| StateError::StoreError(e.to_string()));
                let _ = reply.send(result);
            }

            StateCommand::Shutdown => {
                debug!("actor_loop: Shutdown command");
                info!("StateManager shutting down");
                break;
            }
        }
    }

    debug!("StateManager actor stopped");
}
