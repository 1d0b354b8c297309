//! Tool handler port and runtime registry
//!
//! A [`ToolHandler`] is the executable side of a tool: it receives the full
//! unfiltered params bag plus a shared [`ToolContext`] and returns structured
//! JSON or an explicit [`ToolError`]. Handlers are registered once at
//! startup; during routing the registry is a read-only lookup.
//!
//! The registry is deliberately decoupled from the
//! [`ToolGraph`](dockhand_domain::ToolGraph): the graph's metadata always
//! includes producers even when a handler was never registered, so planning
//! never fails — only execution does, with a precise "Tool not found" error.

use async_trait::async_trait;
use dockhand_domain::{ToolError, ToolOutput};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared context handed to every handler invocation
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// Root of the workspace the tools operate on
    pub workspace_root: PathBuf,
    /// Arbitrary shared values (registry host, namespace, timeouts, ...)
    pub values: HashMap<String, Value>,
}

impl ToolContext {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            values: HashMap::new(),
        }
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_str())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.values.get(key).and_then(|v| v.as_u64())
    }
}

/// Port for executing one tool
///
/// Every tool in a routed chain receives the same params object; each
/// handler reads only the fields it needs.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn execute(&self, params: &Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError>;
}

/// Runtime lookup table from tool name to handler
///
/// Built once at process start and immutable thereafter.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler under a tool name (builder pattern)
    pub fn register<H: ToolHandler + 'static>(mut self, name: impl Into<String>, handler: H) -> Self {
        self.handlers.insert(name.into(), Arc::new(handler));
        self
    }

    /// Register a handler (Arc version)
    pub fn register_arc(mut self, name: impl Into<String>, handler: Arc<dyn ToolHandler>) -> Self {
        self.handlers.insert(name.into(), handler);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoHandler;

    #[async_trait]
    impl ToolHandler for EchoHandler {
        async fn execute(
            &self,
            params: &Value,
            _ctx: &ToolContext,
        ) -> Result<ToolOutput, ToolError> {
            Ok(params.clone())
        }
    }

    #[tokio::test]
    async fn test_registry_lookup_and_execute() {
        let registry = HandlerRegistry::new().register("echo", EchoHandler);

        assert!(registry.has_tool("echo"));
        assert!(!registry.has_tool("missing"));

        let handler = registry.get("echo").unwrap();
        let ctx = ToolContext::default();
        let out = handler.execute(&json!({"a": 1}), &ctx).await.unwrap();
        assert_eq!(out, json!({"a": 1}));
    }

    #[test]
    fn test_context_accessors() {
        let ctx = ToolContext::new("/work")
            .with_value("registry", "ghcr.io/acme")
            .with_value("build_timeout_secs", 300u64);

        assert_eq!(ctx.workspace_root(), Path::new("/work"));
        assert_eq!(ctx.get_str("registry"), Some("ghcr.io/acme"));
        assert_eq!(ctx.get_u64("build_timeout_secs"), Some(300));
        assert_eq!(ctx.get_str("missing"), None);
    }
}
