//! Cluster tools: prepare_cluster, deploy_application, verify_deployment
//!
//! Thin wrappers around the kubectl CLI. The optional `kube_context`
//! context value is threaded into every invocation.

use crate::tools::command::run_command;
use async_trait::async_trait;
use dockhand_application::{ToolContext, ToolHandler};
use dockhand_domain::{ToolError, ToolOutput};
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_KUBECTL_TIMEOUT_SECS: u64 = 60;

/// Assemble kubectl args with the optional `--context` flag prepended
fn kubectl_args<'a>(ctx: &'a ToolContext, args: &[&'a str]) -> Vec<&'a str> {
    let mut full = Vec::with_capacity(args.len() + 2);
    if let Some(context) = ctx.get_str("kube_context") {
        full.push("--context");
        full.push(context);
    }
    full.extend_from_slice(args);
    full
}

fn namespace(ctx: &ToolContext) -> String {
    ctx.get_str("namespace").unwrap_or("default").to_string()
}

/// Ensures the target namespace exists
pub struct PrepareClusterHandler;

#[async_trait]
impl ToolHandler for PrepareClusterHandler {
    async fn execute(&self, _params: &Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let ns = namespace(ctx);
        let timeout = Duration::from_secs(DEFAULT_KUBECTL_TIMEOUT_SECS);

        let probe = run_command(
            "kubectl",
            &kubectl_args(ctx, &["get", "namespace", &ns]),
            timeout,
        )
        .await?;
        if probe.success() {
            return Ok(json!({ "namespace": ns, "created": false }));
        }

        let create = run_command(
            "kubectl",
            &kubectl_args(ctx, &["create", "namespace", &ns]),
            timeout,
        )
        .await?;
        // A concurrent creator is fine.
        if !create.success() && !create.output.contains("AlreadyExists") {
            return Err(ToolError::execution_failed(format!(
                "kubectl create namespace exited with code {}",
                create.exit_code
            ))
            .with_details(create.tail(10)));
        }

        Ok(json!({ "namespace": ns, "created": create.success() }))
    }
}

/// Applies the generated manifests to the cluster
pub struct DeployApplicationHandler;

#[async_trait]
impl ToolHandler for DeployApplicationHandler {
    async fn execute(&self, params: &Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let ns = namespace(ctx);
        let manifest_dir = params
            .get("manifest_dir")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| ctx.workspace_root.join("k8s").display().to_string());

        let out = run_command(
            "kubectl",
            &kubectl_args(ctx, &["apply", "-f", &manifest_dir, "-n", &ns]),
            Duration::from_secs(DEFAULT_KUBECTL_TIMEOUT_SECS),
        )
        .await?;

        if !out.success() {
            return Err(ToolError::execution_failed(format!(
                "kubectl apply exited with code {}",
                out.exit_code
            ))
            .with_details(out.tail(20)));
        }

        Ok(json!({
            "namespace": ns,
            "manifest_dir": manifest_dir,
            "applied": out.tail(20),
        }))
    }
}

/// Waits for the deployment rollout to finish
pub struct VerifyDeploymentHandler;

#[async_trait]
impl ToolHandler for VerifyDeploymentHandler {
    async fn execute(&self, params: &Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let ns = namespace(ctx);
        let app = params
            .get("app_name")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| {
                ctx.workspace_root
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
            })
            .ok_or_else(|| ToolError::invalid_argument("Missing required argument: app_name"))?;

        let rollout_timeout = ctx.get_u64("rollout_timeout_secs").unwrap_or(120);
        let deployment = format!("deployment/{}", app);
        let timeout_flag = format!("--timeout={}s", rollout_timeout);

        let out = run_command(
            "kubectl",
            &kubectl_args(
                ctx,
                &["rollout", "status", &deployment, "-n", &ns, &timeout_flag],
            ),
            // Give kubectl's own timeout room to fire first.
            Duration::from_secs(rollout_timeout + 30),
        )
        .await?;

        if !out.success() {
            return Err(ToolError::execution_failed(format!(
                "rollout of {} did not complete",
                deployment
            ))
            .with_details(out.tail(10)));
        }

        Ok(json!({
            "deployment": deployment,
            "namespace": ns,
            "ready": true,
        }))
    }
}
