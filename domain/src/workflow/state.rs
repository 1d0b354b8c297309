//! Per-session workflow state
//!
//! A [`WorkflowState`] records which steps a session has already satisfied
//! and the last result of every tool that ran for it. The router is the only
//! writer; persistence, TTL, and eviction belong to the session store.

use crate::workflow::step::Step;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

/// Persisted record of a session's progress through the workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    pub session_id: String,
    /// Steps already satisfied; a set, so duplicates are impossible
    pub completed_steps: BTreeSet<Step>,
    /// Last result per tool name (last-write-wins)
    pub results: HashMap<String, Value>,
    /// Free-form session metadata
    pub metadata: HashMap<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowState {
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            completed_steps: BTreeSet::new(),
            results: HashMap::new(),
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a successful tool run: merge its effects into the completed
    /// set and store its output (overwriting any prior result).
    pub fn record(&mut self, tool_name: &str, produces: &BTreeSet<Step>, output: Value) {
        self.completed_steps.extend(produces.iter().copied());
        self.results.insert(tool_name.to_string(), output);
        self.updated_at = Utc::now();
    }

    /// Check whether every step in `steps` is already satisfied
    pub fn is_satisfied(&self, steps: &BTreeSet<Step>) -> bool {
        steps.is_subset(&self.completed_steps)
    }
}
