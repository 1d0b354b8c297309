//! Repository analysis tool: analyze_repo

use crate::tools::workspace;
use async_trait::async_trait;
use dockhand_application::{ToolContext, ToolHandler};
use dockhand_domain::{ToolError, ToolOutput};
use serde_json::{json, Value};
use std::path::PathBuf;

/// Classifies the workspace: language, framework, build system, port
pub struct AnalyzeRepoHandler;

#[async_trait]
impl ToolHandler for AnalyzeRepoHandler {
    async fn execute(&self, params: &Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let root = params
            .get("path")
            .and_then(|v| v.as_str())
            .map(PathBuf::from)
            .unwrap_or_else(|| ctx.workspace_root.clone());

        if !root.is_dir() {
            return Err(ToolError::not_found(root.display().to_string()));
        }

        let profile = workspace::inspect(&root);
        Ok(json!({
            "path": root.display().to_string(),
            "language": profile.language,
            "framework": profile.framework,
            "build_system": profile.build_system,
            "port": profile.default_port,
            "has_dockerfile": profile.has_dockerfile,
        }))
    }
}
