//! In-memory session store

use std::collections::HashMap;

use super::{SessionStore, StoreError, sort_recent_first};
use crate::domain::TripSession;

/// Sessions held in a map; lost when the process exits
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: HashMap<String, TripSession>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, id: &str) -> Result<Option<TripSession>, StoreError> {
        Ok(self.sessions.get(id).cloned())
    }

    fn put(&mut self, session: &TripSession) -> Result<(), StoreError> {
        self.sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    fn clear(&mut self, id: &str) -> Result<bool, StoreError> {
        Ok(self.sessions.remove(id).is_some())
    }

    fn list(&self) -> Result<Vec<TripSession>, StoreError> {
        let mut sessions: Vec<TripSession> = self.sessions.values().cloned().collect();
        sort_recent_first(&mut sessions);
        Ok(sessions)
    }
}
