use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;

use crate::flows::states::SessionState;

/// Per-session menu state. Writers replace the whole record, so concurrent
/// turns on one session id resolve last-write-wins and never interleave fields.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: &str) -> Option<SessionState>;
    async fn put(&self, state: SessionState);
    async fn remove(&self, session_id: &str);
    /// Drops idle sessions and returns how many were removed.
    async fn purge_expired(&self) -> usize;
    async fn len(&self) -> usize;
}

pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionState>>,
    idle_ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(idle_ttl: Duration) -> Self {
        Self { sessions: RwLock::new(HashMap::new()), idle_ttl }
    }

    fn is_expired(&self, state: &SessionState) -> bool {
        Utc::now().signed_duration_since(state.updated_at) >= self.idle_ttl
    }

    fn evict_if_idle(
        &self,
        sessions: &mut HashMap<String, SessionState>,
        session_id: &str,
    ) -> Option<SessionState> {
        match sessions.get(session_id) {
            Some(state) if !self.is_expired(state) => Some(state.clone()),
            Some(_) => {
                sessions.remove(session_id);
                None
            }
            None => None,
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(Duration::minutes(30))
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> Option<SessionState> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(session_id) {
                Some(state) if !self.is_expired(state) => return Some(state.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // A put may have refreshed the record between the two locks.
        let mut sessions = self.sessions.write().await;
        self.evict_if_idle(&mut sessions, session_id)
    }

    async fn put(&self, mut state: SessionState) {
        state.updated_at = Utc::now();
        let mut sessions = self.sessions.write().await;
        sessions.insert(state.session_id.clone(), state);
    }

    async fn remove(&self, session_id: &str) {
        self.sessions.write().await.remove(session_id);
    }

    async fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let now = Utc::now();
        sessions.retain(|_, state| now.signed_duration_since(state.updated_at) < self.idle_ttl);
        before - sessions.len()
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use crate::flows::session::{InMemorySessionStore, SessionStore};
    use crate::flows::states::SessionState;

    #[tokio::test]
    async fn in_memory_session_round_trip() {
        let store = InMemorySessionStore::default();
        let state = SessionState::uniform_lookup("web-1");

        store.put(state.clone()).await;
        let found = store.get("web-1").await.expect("session exists");

        assert_eq!(found.session_id, state.session_id);
        assert_eq!(found.step, 1);
        assert_eq!(store.len().await, 1);

        store.remove("web-1").await;
        assert!(store.get("web-1").await.is_none());
    }

    #[tokio::test]
    async fn idle_sessions_read_as_absent_and_are_purged() {
        let store = InMemorySessionStore::new(Duration::zero());
        store.put(SessionState::uniform_lookup("a")).await;
        store.put(SessionState::uniform_lookup("b")).await;

        assert!(store.get("a").await.is_none());
        assert_eq!(store.len().await, 1, "expired read evicts the record");
        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn eviction_rechecks_a_refreshed_record() {
        let store = InMemorySessionStore::default();
        store.put(SessionState::uniform_lookup("busy")).await;

        let mut sessions = store.sessions.write().await;
        assert!(store.evict_if_idle(&mut sessions, "busy").is_some());
        assert!(sessions.contains_key("busy"), "fresh record must survive the write phase");
        drop(sessions);

        let idle = InMemorySessionStore::new(Duration::zero());
        idle.put(SessionState::uniform_lookup("busy")).await;
        let mut sessions = idle.sessions.write().await;
        assert!(idle.evict_if_idle(&mut sessions, "busy").is_none());
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn live_sessions_survive_purge() {
        let store = InMemorySessionStore::default();
        store.put(SessionState::uniform_lookup("live")).await;

        assert_eq!(store.purge_expired().await, 0);
        assert!(store.get("live").await.is_some());
    }
}
