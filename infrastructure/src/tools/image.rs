//! Image lifecycle tools: build_image, scan_image, push_image
//!
//! All three shell out to the docker CLI through
//! [`run_command`](crate::tools::command::run_command).

use crate::tools::command::run_command;
use async_trait::async_trait;
use dockhand_application::{ToolContext, ToolHandler};
use dockhand_domain::{ToolError, ToolOutput};
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_BUILD_TIMEOUT_SECS: u64 = 600;
const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 300;
const DEFAULT_PUSH_TIMEOUT_SECS: u64 = 300;

/// Full image reference from the shared params bag
///
/// `image_name` is required; `tag` defaults to `latest` unless the name
/// already carries one.
pub fn image_ref(params: &Value) -> Result<String, ToolError> {
    let name = params
        .get("image_name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::invalid_argument("Missing required argument: image_name"))?;

    if name.contains(':') {
        return Ok(name.to_string());
    }
    let tag = params
        .get("tag")
        .and_then(|v| v.as_str())
        .unwrap_or("latest");
    Ok(format!("{}:{}", name, tag))
}

/// Builds the image from the workspace's Dockerfile
pub struct BuildImageHandler;

#[async_trait]
impl ToolHandler for BuildImageHandler {
    async fn execute(&self, params: &Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let image = image_ref(params)?;
        let context_path = params
            .get("context_path")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| ctx.workspace_root.display().to_string());
        let timeout = ctx
            .get_u64("build_timeout_secs")
            .unwrap_or(DEFAULT_BUILD_TIMEOUT_SECS);

        let out = run_command(
            "docker",
            &["build", "-t", &image, &context_path],
            Duration::from_secs(timeout),
        )
        .await?;

        if !out.success() {
            return Err(ToolError::execution_failed(format!(
                "docker build exited with code {}",
                out.exit_code
            ))
            .with_details(out.tail(20)));
        }

        Ok(json!({
            "image": image,
            "context": context_path,
            "duration_ms": out.duration_ms,
        }))
    }
}

/// Scans the built image for vulnerabilities via `docker scout`
pub struct ScanImageHandler;

#[async_trait]
impl ToolHandler for ScanImageHandler {
    async fn execute(&self, params: &Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let image = image_ref(params)?;
        let timeout = ctx
            .get_u64("scan_timeout_secs")
            .unwrap_or(DEFAULT_SCAN_TIMEOUT_SECS);

        let out = run_command(
            "docker",
            &["scout", "cves", &image],
            Duration::from_secs(timeout),
        )
        .await?;

        if !out.success() {
            return Err(ToolError::execution_failed(format!(
                "docker scout exited with code {}",
                out.exit_code
            ))
            .with_details(out.tail(20)));
        }

        Ok(json!({
            "image": image,
            "report": out.tail(100),
            "duration_ms": out.duration_ms,
        }))
    }
}

/// Tags the image for the configured registry and pushes it
pub struct PushImageHandler;

#[async_trait]
impl ToolHandler for PushImageHandler {
    async fn execute(&self, params: &Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let image = image_ref(params)?;
        let timeout = ctx
            .get_u64("push_timeout_secs")
            .unwrap_or(DEFAULT_PUSH_TIMEOUT_SECS);

        let target = match ctx.get_str("registry") {
            Some(registry) => {
                let target = format!("{}/{}", registry.trim_end_matches('/'), image);
                let tag = run_command(
                    "docker",
                    &["tag", &image, &target],
                    Duration::from_secs(30),
                )
                .await?;
                if !tag.success() {
                    return Err(ToolError::execution_failed(format!(
                        "docker tag exited with code {}",
                        tag.exit_code
                    ))
                    .with_details(tag.tail(10)));
                }
                target
            }
            None => image.clone(),
        };

        let out = run_command("docker", &["push", &target], Duration::from_secs(timeout)).await?;
        if !out.success() {
            return Err(ToolError::execution_failed(format!(
                "docker push exited with code {}",
                out.exit_code
            ))
            .with_details(out.tail(20)));
        }

        Ok(json!({
            "image": target,
            "duration_ms": out.duration_ms,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_ref_applies_default_tag() {
        assert_eq!(image_ref(&json!({"image_name": "app"})).unwrap(), "app:latest");
    }

    #[test]
    fn test_image_ref_respects_explicit_tag() {
        let params = json!({"image_name": "app", "tag": "v2"});
        assert_eq!(image_ref(&params).unwrap(), "app:v2");
    }

    #[test]
    fn test_image_ref_keeps_embedded_tag() {
        let params = json!({"image_name": "app:pinned", "tag": "ignored"});
        assert_eq!(image_ref(&params).unwrap(), "app:pinned");
    }

    #[test]
    fn test_image_ref_requires_image_name() {
        let err = image_ref(&json!({})).unwrap_err();
        assert_eq!(err.code, "INVALID_ARGUMENT");
    }

    #[tokio::test]
    async fn test_build_rejects_missing_image_name_before_spawning() {
        let ctx = ToolContext::default();
        let err = BuildImageHandler
            .execute(&Value::Null, &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.code, "INVALID_ARGUMENT");
    }
}
