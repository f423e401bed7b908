//! Session storage backends
//!
//! The StateManager actor owns exactly one `SessionStore`, so backends do not
//! need internal synchronization for in-process callers. The file backend
//! additionally takes an OS lock to guard against other processes.

mod file;
mod memory;

use thiserror::Error;

use crate::domain::TripSession;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

/// Errors from a storage backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Invalid session id: {0}")]
    InvalidId(String),
}

/// Key-value store of sessions, keyed by session id
pub trait SessionStore: Send {
    /// Load a session, `None` if it does not exist
    fn get(&self, id: &str) -> Result<Option<TripSession>, StoreError>;

    /// Insert or replace a session
    fn put(&mut self, session: &TripSession) -> Result<(), StoreError>;

    /// Remove a session; returns whether it existed
    fn clear(&mut self, id: &str) -> Result<bool, StoreError>;

    /// All sessions, most recently updated first
    fn list(&self) -> Result<Vec<TripSession>, StoreError>;
}

pub(crate) fn sort_recent_first(sessions: &mut [TripSession]) {
    sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
}
