//! Live session registry
//!
//! Sessions are keyed by identity. Iteration order is unspecified; broadcast
//! only guarantees that each eligible session is visited once.
//!
//! Concurrency note: the registry is not synchronized on its own. It lives
//! inside the `Broker`, whose lock makes add/remove mutually exclusive with
//! broadcast iteration.

use std::collections::HashMap;

use super::handle::{Session, SessionId};

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Register a session. A session already registered under the same id is replaced.
    pub fn add(&mut self, session: Session) -> Option<Session> {
        self.sessions.insert(session.id.clone(), session)
    }

    pub fn remove(&mut self, id: &str) -> Option<Session> {
        self.sessions.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn for_each<F>(&self, f: F)
    where
        F: FnMut(&Session),
    {
        self.sessions.values().for_each(f);
    }
}
