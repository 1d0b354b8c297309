//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Every field has a default so a missing file or section is never an error.

use dockhand_application::ToolContext;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Session store settings
    pub session: FileSessionConfig,
    /// Docker build/scan/push settings
    pub docker: FileDockerConfig,
    /// Kubernetes deployment settings
    pub kubernetes: FileKubernetesConfig,
    /// Workspace settings
    pub workspace: FileWorkspaceConfig,
}

/// `[session]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSessionConfig {
    /// Seconds of inactivity before a session expires
    pub ttl_secs: i64,
    /// Maximum number of live sessions
    pub max_sessions: usize,
}

impl Default for FileSessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 1800,
            max_sessions: 256,
        }
    }
}

/// `[docker]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDockerConfig {
    /// Registry prefix for pushed images (e.g. "ghcr.io/acme")
    pub registry: Option<String>,
    /// Timeout for `docker build` invocations
    pub build_timeout_secs: u64,
}

impl Default for FileDockerConfig {
    fn default() -> Self {
        Self {
            registry: None,
            build_timeout_secs: 600,
        }
    }
}

/// `[kubernetes]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileKubernetesConfig {
    /// Target namespace for manifests and deployments
    pub namespace: String,
    /// Optional kubectl context
    pub context: Option<String>,
    /// Timeout for rollout status checks
    pub rollout_timeout_secs: u64,
}

impl Default for FileKubernetesConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            context: None,
            rollout_timeout_secs: 120,
        }
    }
}

/// `[workspace]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileWorkspaceConfig {
    /// Root of the repository the tools operate on; defaults to the
    /// current directory
    pub root: Option<PathBuf>,
}

impl FileConfig {
    /// Build the shared [`ToolContext`] handed to every handler invocation
    pub fn tool_context(&self) -> ToolContext {
        let root = self
            .workspace
            .root
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));

        let mut ctx = ToolContext::new(root)
            .with_value("namespace", self.kubernetes.namespace.clone())
            .with_value("build_timeout_secs", self.docker.build_timeout_secs)
            .with_value("rollout_timeout_secs", self.kubernetes.rollout_timeout_secs);

        if let Some(registry) = &self.docker.registry {
            ctx = ctx.with_value("registry", registry.clone());
        }
        if let Some(context) = &self.kubernetes.context {
            ctx = ctx.with_value("kube_context", context.clone());
        }
        ctx
    }
}
