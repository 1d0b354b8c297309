//! Session store port
//!
//! Defines how the router reads and persists workflow state. The store owns
//! persistence, TTL, and eviction; the router only consumes this
//! get/create/update contract and treats update failures after a successful
//! tool run as non-fatal.

use async_trait::async_trait;
use dockhand_domain::{Step, WorkflowState};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// Errors a session store implementation may report
#[derive(Error, Debug, Clone)]
pub enum SessionStoreError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Backend(String),
}

/// Partial update applied to a session
///
/// `completed_steps`, when present, replaces the stored set; `results` and
/// `metadata` merge into the stored maps (last-write-wins per key).
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub completed_steps: Option<BTreeSet<Step>>,
    pub results: HashMap<String, Value>,
    pub metadata: HashMap<String, Value>,
}

impl SessionPatch {
    /// Patch recording one successful tool run
    pub fn step_result(
        completed_steps: BTreeSet<Step>,
        tool_name: impl Into<String>,
        output: Value,
    ) -> Self {
        Self {
            completed_steps: Some(completed_steps),
            results: HashMap::from([(tool_name.into(), output)]),
            metadata: HashMap::new(),
        }
    }
}

/// Port for session persistence
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait SessionStorePort: Send + Sync {
    /// Fetch a session by id; `Ok(None)` when it does not exist (or expired)
    async fn get(&self, session_id: &str) -> Result<Option<WorkflowState>, SessionStoreError>;

    /// Create a new session, minting an id when none is supplied
    async fn create(&self, session_id: Option<String>)
        -> Result<WorkflowState, SessionStoreError>;

    /// Apply a partial update and return the persisted state
    async fn update(
        &self,
        session_id: &str,
        patch: SessionPatch,
    ) -> Result<WorkflowState, SessionStoreError>;
}
