//! Kubernetes manifest generation tool: generate_k8s_manifests

use crate::tools::workspace;
use async_trait::async_trait;
use dockhand_application::{ToolContext, ToolHandler};
use dockhand_domain::{ToolError, ToolOutput};
use serde_json::{json, Value};
use std::fs;

/// App name from params, falling back to the workspace directory name
fn app_name(params: &Value, ctx: &ToolContext) -> String {
    params
        .get("app_name")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .or_else(|| {
            ctx.workspace_root
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
        })
        .unwrap_or_else(|| "app".to_string())
}

fn deployment(app: &str, namespace: &str, image: &str, port: u16, replicas: u64) -> Value {
    json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": { "name": app, "namespace": namespace, "labels": { "app": app } },
        "spec": {
            "replicas": replicas,
            "selector": { "matchLabels": { "app": app } },
            "template": {
                "metadata": { "labels": { "app": app } },
                "spec": {
                    "containers": [{
                        "name": app,
                        "image": image,
                        "ports": [{ "containerPort": port }],
                    }],
                },
            },
        },
    })
}

fn service(app: &str, namespace: &str, port: u16) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": { "name": app, "namespace": namespace },
        "spec": {
            "selector": { "app": app },
            "ports": [{ "port": 80, "targetPort": port }],
        },
    })
}

/// Writes Deployment and Service manifests under `<workspace>/k8s/`
pub struct GenerateManifestsHandler;

#[async_trait]
impl ToolHandler for GenerateManifestsHandler {
    async fn execute(&self, params: &Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let app = app_name(params, ctx);
        let namespace = ctx.get_str("namespace").unwrap_or("default").to_string();
        let image = params
            .get("image_name")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}:latest", app));
        let port = params
            .get("port")
            .and_then(|v| v.as_u64())
            .map(|p| p as u16)
            .unwrap_or_else(|| workspace::inspect(&ctx.workspace_root).default_port);
        let replicas = params.get("replicas").and_then(|v| v.as_u64()).unwrap_or(1);

        let dir = ctx.workspace_root.join("k8s");
        fs::create_dir_all(&dir).map_err(|error| {
            ToolError::execution_failed(format!("Failed to create {}: {}", dir.display(), error))
        })?;

        let mut written = Vec::new();
        let documents = [
            ("deployment.yaml", deployment(&app, &namespace, &image, port, replicas)),
            ("service.yaml", service(&app, &namespace, port)),
        ];
        for (filename, document) in documents {
            let path = dir.join(filename);
            let yaml = serde_yaml::to_string(&document).map_err(|error| {
                ToolError::execution_failed(format!("Failed to render {}: {}", filename, error))
            })?;
            fs::write(&path, yaml).map_err(|error| {
                ToolError::execution_failed(format!("Failed to write {}: {}", path.display(), error))
            })?;
            written.push(path.display().to_string());
        }

        Ok(json!({
            "app": app,
            "namespace": namespace,
            "image": image,
            "manifests": written,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_writes_deployment_and_service() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(dir.path()).with_value("namespace", "staging");
        let params = json!({"app_name": "shop", "image_name": "shop:v1", "port": 3000});

        let out = GenerateManifestsHandler.execute(&params, &ctx).await.unwrap();
        assert_eq!(out["namespace"], "staging");
        assert_eq!(out["manifests"].as_array().unwrap().len(), 2);

        let raw = fs::read_to_string(dir.path().join("k8s/deployment.yaml")).unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&raw).unwrap();
        assert_eq!(doc["kind"], "Deployment");
        assert_eq!(doc["metadata"]["name"], "shop");
        assert_eq!(
            doc["spec"]["template"]["spec"]["containers"][0]["image"],
            "shop:v1"
        );

        let raw = fs::read_to_string(dir.path().join("k8s/service.yaml")).unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&raw).unwrap();
        assert_eq!(doc["kind"], "Service");
        assert_eq!(doc["spec"]["ports"][0]["targetPort"], 3000);
    }

    #[tokio::test]
    async fn test_defaults_derive_from_workspace() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), "{}").unwrap();

        let ctx = ToolContext::new(dir.path());
        let out = GenerateManifestsHandler
            .execute(&Value::Null, &ctx)
            .await
            .unwrap();

        // App named after the directory, port from the detected stack.
        let app = out["app"].as_str().unwrap();
        assert_eq!(out["image"], format!("{}:latest", app));
        assert_eq!(out["namespace"], "default");

        let raw = fs::read_to_string(dir.path().join("k8s/service.yaml")).unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&raw).unwrap();
        assert_eq!(doc["spec"]["ports"][0]["targetPort"], 3000);
    }
}
