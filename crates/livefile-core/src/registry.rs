//! The set of live client sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use crate::session::{ClientSession, SessionConfig, SessionId};

/// Concurrent map of open sessions.
///
/// Broadcasts iterate a [`snapshot`](Self::snapshot) so connection churn never
/// blocks on, or is blocked by, delivery.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<ClientSession>>>,
    next_id: AtomicU64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with a fresh id and register it.
    pub fn open_session(&self, config: &SessionConfig) -> Arc<ClientSession> {
        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let session = Arc::new(ClientSession::new(id, config));
        self.add(Arc::clone(&session));
        session
    }

    fn add(&self, session: Arc<ClientSession>) {
        let id = session.id();
        let mut sessions = self.sessions.write();
        sessions.insert(id, session);
        debug!(session = %id, total = sessions.len(), "client registered");
    }

    /// Remove a session. Returns `false` if it was already gone.
    pub fn remove(&self, id: SessionId) -> bool {
        let mut sessions = self.sessions.write();
        let removed = sessions.remove(&id).is_some();
        if removed {
            debug!(session = %id, total = sessions.len(), "client unregistered");
        }
        removed
    }

    /// Point-in-time copy of the registered sessions.
    pub fn snapshot(&self) -> Vec<Arc<ClientSession>> {
        self.sessions.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
