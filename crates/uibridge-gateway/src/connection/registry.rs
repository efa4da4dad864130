use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use uibridge_core::protocol::UiEntityType;

use super::UiConnection;

/// Live UI connections: `session_id -> UiConnection`.
pub struct ConnectionRegistry {
    sessions: DashMap<String, Arc<UiConnection>>,
    seq: AtomicU64,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            seq: AtomicU64::new(1),
        }
    }

    pub fn next_session_id(&self) -> String {
        format!("ui-{}", self.seq.fetch_add(1, Ordering::Relaxed))
    }

    pub fn insert(&self, conn: Arc<UiConnection>) {
        self.sessions.insert(conn.session().to_string(), conn);
    }

    pub fn remove(&self, session: &str) -> Option<Arc<UiConnection>> {
        self.sessions.remove(session).map(|(_, conn)| conn)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Fan `entitiesUpdated` out to every live connection.
    /// Returns how many connections were notified.
    pub async fn notify_entities_updated(&self, entity_type: UiEntityType) -> usize {
        // Snapshot first: no DashMap guard may be held across an await.
        let conns: Vec<Arc<UiConnection>> =
            self.sessions.iter().map(|r| Arc::clone(r.value())).collect();
        for conn in &conns {
            conn.notify_entities_updated(entity_type).await;
        }
        conns.len()
    }
}
