//! Base image recommendation tool: resolve_base_images

use crate::tools::workspace;
use async_trait::async_trait;
use dockhand_application::{ToolContext, ToolHandler};
use dockhand_domain::{ToolError, ToolOutput};
use serde_json::{json, Value};

/// Build and runtime base images for a language stack
pub fn recommend(language: &str) -> (&'static str, &'static str) {
    match language {
        "rust" => ("rust:1.82-bookworm", "debian:bookworm-slim"),
        "go" => ("golang:1.23-bookworm", "gcr.io/distroless/static-debian12"),
        "javascript" => ("node:22-alpine", "node:22-alpine"),
        "python" => ("python:3.12-slim", "python:3.12-slim"),
        "java" => ("eclipse-temurin:21-jdk", "eclipse-temurin:21-jre"),
        _ => ("debian:bookworm", "debian:bookworm-slim"),
    }
}

/// Picks build/runtime base images for the detected (or declared) language
pub struct ResolveBaseImagesHandler;

#[async_trait]
impl ToolHandler for ResolveBaseImagesHandler {
    async fn execute(&self, params: &Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let language = match params.get("language").and_then(|v| v.as_str()) {
            Some(language) => language.to_string(),
            None => workspace::inspect(&ctx.workspace_root).language,
        };

        let (build_image, runtime_image) = recommend(&language);
        Ok(json!({
            "language": language,
            "build_image": build_image,
            "runtime_image": runtime_image,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_recommend_known_languages() {
        assert_eq!(recommend("rust").0, "rust:1.82-bookworm");
        assert_eq!(recommend("javascript"), ("node:22-alpine", "node:22-alpine"));
    }

    #[test]
    fn test_recommend_unknown_falls_back() {
        assert_eq!(recommend("cobol").1, "debian:bookworm-slim");
    }

    #[tokio::test]
    async fn test_language_param_wins_over_detection() {
        let ctx = ToolContext::new("/nonexistent");
        let out = ResolveBaseImagesHandler
            .execute(&json!({"language": "python"}), &ctx)
            .await
            .unwrap();
        assert_eq!(out["build_image"], "python:3.12-slim");
    }

    #[tokio::test]
    async fn test_detects_language_from_workspace() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[package]\n").unwrap();

        let ctx = ToolContext::new(dir.path());
        let out = ResolveBaseImagesHandler
            .execute(&Value::Null, &ctx)
            .await
            .unwrap();
        assert_eq!(out["language"], "rust");
        assert_eq!(out["runtime_image"], "debian:bookworm-slim");
    }
}
