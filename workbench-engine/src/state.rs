//! Per-session execution state linking markup and style renders

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

/// Editing session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Fresh random session
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// Requests that do not name a session share this one
impl Default for SessionId {
    fn default() -> Self {
        Self("default".to_string())
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the previous invocations of a session left behind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionState {
    pub last_timestamp: Option<DateTime<Utc>>,
    /// Last markup fragment as submitted
    pub last_markup: Option<String>,
    /// Last composed document (markup with style merged, or a style gallery)
    pub last_composed: Option<String>,
    pub last_script_output: Option<String>,
    pub markup_mode: bool,
}

impl ExecutionState {
    pub fn touch(&mut self) {
        self.last_timestamp = Some(Utc::now());
    }

    /// A style call must re-render the stored markup instead of a gallery
    pub fn composes_with_markup(&self) -> bool {
        self.markup_mode && self.last_markup.is_some()
    }
}

struct SessionEntry {
    state: Arc<Mutex<ExecutionState>>,
    last_used: Instant,
}

/// Session-keyed store of [`ExecutionState`] with LRU and idle eviction.
///
/// Each record sits behind its own mutex, so two renders in the same session
/// run one after the other while different sessions proceed independently.
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
    capacity: usize,
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new(capacity: usize, idle_ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            idle_ttl,
        }
    }

    /// State handle for `session`, created on first use
    pub async fn state(&self, session: &SessionId) -> Arc<Mutex<ExecutionState>> {
        let mut sessions = self.sessions.write().await;

        if let Some(entry) = sessions.get_mut(session) {
            entry.last_used = Instant::now();
            return entry.state.clone();
        }

        if sessions.len() >= self.capacity {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                tracing::debug!(session = %oldest, "Evicting least recently used session");
                sessions.remove(&oldest);
            }
        }

        let state = Arc::new(Mutex::new(ExecutionState::default()));
        sessions.insert(
            session.clone(),
            SessionEntry {
                state: state.clone(),
                last_used: Instant::now(),
            },
        );
        state
    }

    /// Copy of the session state, if the session exists
    pub async fn snapshot(&self, session: &SessionId) -> Option<ExecutionState> {
        let state = {
            let sessions = self.sessions.read().await;
            sessions.get(session)?.state.clone()
        };
        let snapshot = state.lock().await.clone();
        Some(snapshot)
    }

    /// Drop a session; returns whether it existed
    pub async fn end_session(&self, session: &SessionId) -> bool {
        self.sessions.write().await.remove(session).is_some()
    }

    /// Drop sessions idle longer than the TTL; returns how many were removed
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let ttl = self.idle_ttl;
        sessions.retain(|_, entry| entry.last_used.elapsed() <= ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted idle sessions");
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_state_is_created_once_per_session() {
        let store = SessionStore::new(4, Duration::from_secs(60));
        let session = SessionId::from("a");

        store.state(&session).await.lock().await.markup_mode = true;
        assert!(store.state(&session).await.lock().await.markup_mode);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new(4, Duration::from_secs(60));
        store
            .state(&SessionId::from("a"))
            .await
            .lock()
            .await
            .last_markup = Some("<p>a</p>".to_string());

        let other = store.snapshot(&SessionId::from("a")).await.unwrap();
        assert_eq!(other.last_markup.as_deref(), Some("<p>a</p>"));
        assert!(store.snapshot(&SessionId::from("b")).await.is_none());
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let store = SessionStore::new(2, Duration::from_secs(60));
        store.state(&SessionId::from("a")).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        store.state(&SessionId::from("b")).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        // Touch "a" so "b" becomes the oldest
        store.state(&SessionId::from("a")).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        store.state(&SessionId::from("c")).await;

        assert_eq!(store.len().await, 2);
        assert!(store.snapshot(&SessionId::from("a")).await.is_some());
        assert!(store.snapshot(&SessionId::from("b")).await.is_none());
    }

    #[tokio::test]
    async fn test_end_session_and_idle_eviction() {
        let store = SessionStore::new(4, Duration::from_millis(10));
        store.state(&SessionId::from("a")).await;
        assert!(store.end_session(&SessionId::from("a")).await);
        assert!(!store.end_session(&SessionId::from("a")).await);

        store.state(&SessionId::from("b")).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(store.evict_idle().await, 1);
        assert!(store.is_empty().await);
    }

    #[test]
    fn test_composes_with_markup() {
        let mut state = ExecutionState::default();
        assert!(!state.composes_with_markup());
        state.markup_mode = true;
        assert!(!state.composes_with_markup());
        state.last_markup = Some("<p>hi</p>".to_string());
        assert!(state.composes_with_markup());
    }
}
