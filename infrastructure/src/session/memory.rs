//! In-memory session store
//!
//! Implements [`SessionStorePort`] over a `HashMap` behind a tokio
//! `RwLock`. TTL and capacity eviction are this store's own policy and are
//! invisible to the router: an expired session simply reads as absent.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dockhand_application::ports::session_store::{
    SessionPatch, SessionStoreError, SessionStorePort,
};
use dockhand_domain::WorkflowState;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

/// Session store backed by process memory
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, WorkflowState>>,
    ttl: Duration,
    max_sessions: usize,
    counter: AtomicU64,
}

impl InMemorySessionStore {
    pub fn new(ttl_secs: i64, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: Duration::seconds(ttl_secs),
            max_sessions,
            counter: AtomicU64::new(0),
        }
    }

    fn is_expired(&self, state: &WorkflowState) -> bool {
        Utc::now() - state.updated_at > self.ttl
    }

    fn mint_id(&self) -> String {
        format!(
            "session-{}-{}",
            Utc::now().timestamp_millis(),
            self.counter.fetch_add(1, Ordering::SeqCst)
        )
    }

    /// Drop expired sessions and, at capacity, the least recently updated one
    fn evict(&self, sessions: &mut HashMap<String, WorkflowState>) {
        sessions.retain(|_, state| !self.is_expired(state));

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .values()
                .min_by_key(|state| state.updated_at)
                .map(|state| state.session_id.clone());
            match oldest {
                Some(id) => {
                    debug!(session = %id, "Evicting session at capacity");
                    sessions.remove(&id);
                }
                None => break,
            }
        }
    }
}

impl Default for InMemorySessionStore {
    /// 30 minute TTL, 256 sessions
    fn default() -> Self {
        Self::new(1800, 256)
    }
}

#[async_trait]
impl SessionStorePort for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<WorkflowState>, SessionStoreError> {
        let expired = {
            let sessions = self.sessions.read().await;
            match sessions.get(session_id) {
                Some(state) if self.is_expired(state) => true,
                Some(state) => return Ok(Some(state.clone())),
                None => return Ok(None),
            }
        };

        if expired {
            self.sessions.write().await.remove(session_id);
            debug!(session = %session_id, "Session expired");
        }
        Ok(None)
    }

    async fn create(
        &self,
        session_id: Option<String>,
    ) -> Result<WorkflowState, SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        self.evict(&mut sessions);

        let id = session_id.unwrap_or_else(|| self.mint_id());
        let state = WorkflowState::new(&id);
        sessions.insert(id, state.clone());
        Ok(state)
    }

    async fn update(
        &self,
        session_id: &str,
        patch: SessionPatch,
    ) -> Result<WorkflowState, SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        let state = sessions
            .get_mut(session_id)
            .ok_or_else(|| SessionStoreError::NotFound(session_id.to_string()))?;

        if let Some(steps) = patch.completed_steps {
            state.completed_steps = steps;
        }
        state.results.extend(patch.results);
        state.metadata.extend(patch.metadata);
        state.updated_at = Utc::now();

        Ok(state.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dockhand_domain::Step;
    use serde_json::json;
    use std::collections::BTreeSet;

    #[tokio::test]
    async fn test_create_and_get_round_trip() {
        let store = InMemorySessionStore::default();
        let created = store.create(Some("s1".to_string())).await.unwrap();
        assert_eq!(created.session_id, "s1");

        let fetched = store.get("s1").await.unwrap().unwrap();
        assert_eq!(fetched.session_id, "s1");
        assert!(fetched.completed_steps.is_empty());
    }

    #[tokio::test]
    async fn test_minted_ids_are_unique() {
        let store = InMemorySessionStore::default();
        let a = store.create(None).await.unwrap();
        let b = store.create(None).await.unwrap();
        assert_ne!(a.session_id, b.session_id);
    }

    #[tokio::test]
    async fn test_update_merges_patch() {
        let store = InMemorySessionStore::default();
        store.create(Some("s1".to_string())).await.unwrap();

        let steps: BTreeSet<Step> = [Step::AnalyzedRepo].into_iter().collect();
        let patch = SessionPatch::step_result(steps, "analyze_repo", json!({"language": "rust"}));
        let updated = store.update("s1", patch).await.unwrap();

        assert!(updated.completed_steps.contains(&Step::AnalyzedRepo));
        assert_eq!(updated.results["analyze_repo"], json!({"language": "rust"}));
    }

    #[tokio::test]
    async fn test_update_missing_session() {
        let store = InMemorySessionStore::default();
        let err = store.update("ghost", SessionPatch::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "Session not found: ghost");
    }

    #[tokio::test]
    async fn test_expired_session_reads_as_absent() {
        let store = InMemorySessionStore::new(0, 16);
        store.create(Some("s1".to_string())).await.unwrap();

        // ttl of zero expires immediately
        assert!(store.get("s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_updated() {
        let store = InMemorySessionStore::new(3600, 2);
        store.create(Some("old".to_string())).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.create(Some("mid".to_string())).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.create(Some("new".to_string())).await.unwrap();

        assert!(store.get("old").await.unwrap().is_none());
        assert!(store.get("mid").await.unwrap().is_some());
        assert!(store.get("new").await.unwrap().is_some());
    }
}
