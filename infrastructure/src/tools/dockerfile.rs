//! Dockerfile generation tool: generate_dockerfile

use crate::tools::base_images;
use crate::tools::workspace::{self, RepoProfile};
use async_trait::async_trait;
use dockhand_application::{ToolContext, ToolHandler};
use dockhand_domain::{ToolError, ToolOutput};
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;

/// Renders a Dockerfile for the detected stack and writes it into the
/// workspace
pub struct GenerateDockerfileHandler;

fn render(profile: &RepoProfile, build_image: &str, runtime_image: &str) -> String {
    let port = profile.default_port;
    match profile.language.as_str() {
        "rust" => format!(
            "FROM {build_image} AS builder\n\
             WORKDIR /app\n\
             COPY . .\n\
             RUN cargo build --release\n\
             \n\
             FROM {runtime_image}\n\
             WORKDIR /app\n\
             COPY --from=builder /app/target/release/ /app/\n\
             EXPOSE {port}\n\
             CMD [\"/app/app\"]\n"
        ),
        "go" => format!(
            "FROM {build_image} AS builder\n\
             WORKDIR /app\n\
             COPY . .\n\
             RUN CGO_ENABLED=0 go build -o /bin/app ./...\n\
             \n\
             FROM {runtime_image}\n\
             COPY --from=builder /bin/app /bin/app\n\
             EXPOSE {port}\n\
             ENTRYPOINT [\"/bin/app\"]\n"
        ),
        "java" => format!(
            "FROM {build_image} AS builder\n\
             WORKDIR /app\n\
             COPY . .\n\
             RUN ./mvnw -q package -DskipTests || mvn -q package -DskipTests\n\
             \n\
             FROM {runtime_image}\n\
             WORKDIR /app\n\
             COPY --from=builder /app/target/*.jar /app/app.jar\n\
             EXPOSE {port}\n\
             CMD [\"java\", \"-jar\", \"/app/app.jar\"]\n"
        ),
        "javascript" => format!(
            "FROM {build_image}\n\
             WORKDIR /app\n\
             COPY package*.json ./\n\
             RUN npm ci --omit=dev\n\
             COPY . .\n\
             EXPOSE {port}\n\
             CMD [\"node\", \"index.js\"]\n"
        ),
        "python" => format!(
            "FROM {build_image}\n\
             WORKDIR /app\n\
             COPY requirements.txt* pyproject.toml* ./\n\
             RUN pip install --no-cache-dir -r requirements.txt || pip install --no-cache-dir .\n\
             COPY . .\n\
             EXPOSE {port}\n\
             CMD [\"python\", \"main.py\"]\n"
        ),
        _ => format!(
            "FROM {runtime_image}\n\
             WORKDIR /app\n\
             COPY . .\n\
             EXPOSE {port}\n\
             CMD [\"/app/start.sh\"]\n"
        ),
    }
}

#[async_trait]
impl ToolHandler for GenerateDockerfileHandler {
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
        let (build_image, runtime_image) = match (
            params.get("build_image").and_then(|v| v.as_str()),
            params.get("runtime_image").and_then(|v| v.as_str()),
        ) {
            (Some(build), Some(runtime)) => (build.to_string(), runtime.to_string()),
            _ => {
                let (build, runtime) = base_images::recommend(&profile.language);
                (build.to_string(), runtime.to_string())
            }
        };

        let content = render(&profile, &build_image, &runtime_image);
        let output_path = params
            .get("output_path")
            .and_then(|v| v.as_str())
            .map(PathBuf::from)
            .unwrap_or_else(|| root.join("Dockerfile"));

        fs::write(&output_path, &content).map_err(|error| {
            ToolError::execution_failed(format!(
                "Failed to write {}: {}",
                output_path.display(),
                error
            ))
        })?;

        Ok(json!({
            "path": output_path.display().to_string(),
            "language": profile.language,
            "build_image": build_image,
            "runtime_image": runtime_image,
            "port": profile.default_port,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_generates_multistage_dockerfile_for_rust() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"app\"\n").unwrap();

        let ctx = ToolContext::new(dir.path());
        let out = GenerateDockerfileHandler
            .execute(&Value::Null, &ctx)
            .await
            .unwrap();

        let content = fs::read_to_string(dir.path().join("Dockerfile")).unwrap();
        assert!(content.starts_with("FROM rust:1.82-bookworm AS builder"));
        assert!(content.contains("FROM debian:bookworm-slim"));
        assert!(content.contains("EXPOSE 8080"));
        assert_eq!(out["language"], "rust");
    }

    #[tokio::test]
    async fn test_explicit_base_images_override_recommendation() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("go.mod"), "module example.com/app\n").unwrap();

        let ctx = ToolContext::new(dir.path());
        let params = json!({
            "build_image": "golang:1.22",
            "runtime_image": "alpine:3.20",
        });
        let out = GenerateDockerfileHandler.execute(&params, &ctx).await.unwrap();

        assert_eq!(out["build_image"], "golang:1.22");
        let content = fs::read_to_string(dir.path().join("Dockerfile")).unwrap();
        assert!(content.contains("FROM alpine:3.20"));
    }

    #[tokio::test]
    async fn test_missing_workspace_is_not_found() {
        let ctx = ToolContext::new("/definitely/not/here");
        let err = GenerateDockerfileHandler
            .execute(&Value::Null, &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.code, "NOT_FOUND");
    }
}
