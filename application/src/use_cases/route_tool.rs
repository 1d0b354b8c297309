//! Tool routing use case
//!
//! The [`ToolRouter`] drives one `route()` call through its states:
//! resolve the session, short-circuit on idempotency, plan the prerequisite
//! chain, execute it strictly sequentially, and accumulate effects into the
//! session after every success.
//!
//! # Failure semantics
//!
//! The engine is fail-fast: the first failing step (missing handler, panic,
//! or explicit handler error) stops the whole call. Everything that already
//! succeeded in the same call stays committed to the session, so a
//! subsequent call skips exactly that prior work. Persistence failures after
//! a successful step are logged and swallowed — the handler's success is the
//! source of truth for this call.
//!
//! # Force semantics
//!
//! `force = true` skips the idempotency short-circuit, skips prerequisite
//! planning entirely (only the named tool executes), still records that
//! tool's effects and result, and auto-creates a session when none was
//! supplied.

use crate::ports::session_store::{SessionPatch, SessionStorePort};
use crate::ports::tool_handler::{HandlerRegistry, ToolContext};
use dockhand_domain::{
    DomainError, ExecutionReadiness, Step, ToolError, ToolGraph, ToolOutput, WorkflowState,
};
use futures::FutureExt;
use serde_json::{json, Value};
use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can terminate a route() call
///
/// The display strings are an observable contract consumed by agents;
/// changing them is a breaking change.
#[derive(Error, Debug)]
pub enum RouteError {
    /// A planned tool has no registered handler
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// A handler panicked (abnormal termination)
    #[error("Tool execution failed: {0}")]
    ExecutionPanicked(String),

    /// A handler returned its explicit failure path; the failing tool's
    /// name is prefixed so multi-step chains stay attributable
    #[error("{tool}: {error}")]
    ToolFailed { tool: String, error: ToolError },

    /// The session could not be fetched or created
    #[error("Failed to get or create session: {0}")]
    Session(String),

    /// Planning failed (unknown tool name)
    #[error("{0}")]
    Planning(#[from] DomainError),
}

/// A request to route one tool
#[derive(Debug, Clone)]
pub struct RouteRequest {
    /// Target tool name
    pub tool_name: String,
    /// Full params bag, handed unfiltered to every tool in the chain
    pub params: Value,
    /// Session to resume; a new session is created when absent
    pub session_id: Option<String>,
    /// Bypass idempotency and precondition resolution
    pub force: bool,
}

impl RouteRequest {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            params: Value::Null,
            session_id: None,
            force: false,
        }
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }
}

/// Outcome of one route() call
///
/// `session` is `None` only when session acquisition itself failed; every
/// later failure still carries the latest session snapshot so callers can
/// see the preserved partial progress.
#[derive(Debug)]
pub struct RouteOutcome {
    pub result: Result<ToolOutput, RouteError>,
    /// Tools that ran to success in this call, in execution order
    pub executed_tools: Vec<String>,
    pub session: Option<WorkflowState>,
}

/// The tool routing engine
///
/// Holds the immutable [`ToolGraph`] (planning), the [`HandlerRegistry`]
/// (execution), and the session store port (state). Concurrent route()
/// calls against the same session id serialize on a per-session advisory
/// lock so the read-modify-write of completed steps stays atomic.
pub struct ToolRouter {
    graph: Arc<ToolGraph>,
    registry: Arc<HandlerRegistry>,
    store: Arc<dyn SessionStorePort>,
    session_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ToolRouter {
    pub fn new(
        graph: Arc<ToolGraph>,
        registry: Arc<HandlerRegistry>,
        store: Arc<dyn SessionStorePort>,
    ) -> Self {
        Self {
            graph,
            registry,
            store,
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn graph(&self) -> &ToolGraph {
        &self.graph
    }

    /// Route a tool request to completion or first failure
    pub async fn route(&self, request: RouteRequest, ctx: &ToolContext) -> RouteOutcome {
        // Serialize concurrent calls on the same session for the duration
        // of the whole route() call.
        let _guard = match &request.session_id {
            Some(id) => Some(self.session_lock(id).lock_owned().await),
            None => None,
        };

        let mut session = match self.resolve_session(request.session_id.as_deref()).await {
            Ok(session) => session,
            Err(error) => {
                return RouteOutcome {
                    result: Err(error),
                    executed_tools: Vec::new(),
                    session: None,
                }
            }
        };

        // A freshly minted session cannot be contended by callers that
        // named it, but taking its lock keeps the invariant uniform.
        let _fresh_guard = if request.session_id.is_none() {
            Some(self.session_lock(&session.session_id).lock_owned().await)
        } else {
            None
        };

        // Idempotency short-circuit
        if !request.force {
            if let Some(meta) = self.graph.metadata(&request.tool_name) {
                if !meta.produces.is_empty() && session.is_satisfied(&meta.produces) {
                    debug!(
                        tool = %request.tool_name,
                        session = %session.session_id,
                        "Effects already satisfied, skipping"
                    );
                    return RouteOutcome {
                        result: Ok(json!({
                            "skipped": true,
                            "reason": "Effects already satisfied"
                        })),
                        executed_tools: Vec::new(),
                        session: Some(session),
                    };
                }
            }
        }

        // Planning: under force the plan is the bare target, prerequisites
        // are never consulted.
        let plan = if request.force {
            vec![request.tool_name.clone()]
        } else {
            match self
                .graph
                .compute_plan(&request.tool_name, &session.completed_steps)
            {
                Ok(plan) => plan,
                Err(error) => {
                    return RouteOutcome {
                        result: Err(RouteError::Planning(error)),
                        executed_tools: Vec::new(),
                        session: Some(session),
                    }
                }
            }
        };

        debug!(
            target = %request.tool_name,
            session = %session.session_id,
            plan = ?plan,
            force = request.force,
            "Computed execution plan"
        );

        // Sequential execution, fail-fast with partial preservation
        let mut executed_tools: Vec<String> = Vec::new();
        let mut last_output: Option<ToolOutput> = None;

        for name in &plan {
            let handler = match self.registry.get(name) {
                Some(handler) => handler,
                None => {
                    return RouteOutcome {
                        result: Err(RouteError::ToolNotFound(name.clone())),
                        executed_tools,
                        session: Some(session),
                    }
                }
            };

            info!(tool = %name, session = %session.session_id, "Executing tool");

            let call = AssertUnwindSafe(handler.execute(&request.params, ctx))
                .catch_unwind()
                .await;

            let output = match call {
                Err(panic) => {
                    return RouteOutcome {
                        result: Err(RouteError::ExecutionPanicked(panic_message(panic.as_ref()))),
                        executed_tools,
                        session: Some(session),
                    }
                }
                Ok(Err(error)) => {
                    return RouteOutcome {
                        result: Err(RouteError::ToolFailed {
                            tool: name.clone(),
                            error,
                        }),
                        executed_tools,
                        session: Some(session),
                    }
                }
                Ok(Ok(output)) => output,
            };

            let produces: BTreeSet<Step> = self
                .graph
                .metadata(name)
                .map(|meta| meta.produces.clone())
                .unwrap_or_default();

            session.record(name, &produces, output.clone());
            executed_tools.push(name.clone());

            // Best-effort durability: a store failure must not convert the
            // tool's success into a failure or halt the remaining plan.
            let patch = SessionPatch::step_result(
                session.completed_steps.clone(),
                name.clone(),
                output.clone(),
            );
            match self.store.update(&session.session_id, patch).await {
                Ok(persisted) => session = persisted,
                Err(error) => warn!(
                    session = %session.session_id,
                    tool = %name,
                    error = %error,
                    "Failed to persist step result, continuing"
                ),
            }

            last_output = Some(output);
        }

        RouteOutcome {
            result: Ok(last_output.unwrap_or(Value::Null)),
            executed_tools,
            session: Some(session),
        }
    }

    /// Pure planning, exposed for callers that want to preview a chain
    pub fn execution_plan(
        &self,
        target: &str,
        completed: &BTreeSet<Step>,
    ) -> Result<Vec<String>, DomainError> {
        self.graph.compute_plan(target, completed)
    }

    /// Direct-requirements readiness check against a session's state
    ///
    /// A missing session counts as an empty completed set.
    pub async fn can_execute(
        &self,
        target: &str,
        session_id: &str,
    ) -> Result<ExecutionReadiness, RouteError> {
        let completed = match self
            .store
            .get(session_id)
            .await
            .map_err(|e| RouteError::Session(e.to_string()))?
        {
            Some(state) => state.completed_steps,
            None => BTreeSet::new(),
        };

        Ok(self.graph.can_execute(target, &completed)?)
    }

    async fn resolve_session(&self, id: Option<&str>) -> Result<WorkflowState, RouteError> {
        let result = match id {
            Some(id) => match self.store.get(id).await {
                Ok(Some(state)) => Ok(state),
                Ok(None) => self.store.create(Some(id.to_string())).await,
                Err(error) => Err(error),
            },
            None => self.store.create(None).await,
        };

        result.map_err(|error| RouteError::Session(error.to_string()))
    }

    fn session_lock(&self, session_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .session_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}
