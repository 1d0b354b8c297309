//! Concrete tool handlers for the containerization workflow
//!
//! Each handler implements the application layer's
//! [`ToolHandler`](dockhand_application::ToolHandler) port. Handlers read
//! only the params they need from the shared bag; shared settings (registry
//! host, namespace, timeouts) come from the
//! [`ToolContext`](dockhand_application::ToolContext).

pub mod analyze;
pub mod base_images;
pub mod cluster;
pub mod command;
pub mod dockerfile;
pub mod image;
pub mod manifests;
pub mod workspace;

pub use analyze::AnalyzeRepoHandler;
pub use base_images::ResolveBaseImagesHandler;
pub use cluster::{DeployApplicationHandler, PrepareClusterHandler, VerifyDeploymentHandler};
pub use dockerfile::GenerateDockerfileHandler;
pub use image::{BuildImageHandler, PushImageHandler, ScanImageHandler};
pub use manifests::GenerateManifestsHandler;

use dockhand_application::HandlerRegistry;

/// Registry with every built-in handler, names matching the
/// containerization graph
pub fn default_registry() -> HandlerRegistry {
    HandlerRegistry::new()
        .register("analyze_repo", AnalyzeRepoHandler)
        .register("resolve_base_images", ResolveBaseImagesHandler)
        .register("generate_dockerfile", GenerateDockerfileHandler)
        .register("build_image", BuildImageHandler)
        .register("scan_image", ScanImageHandler)
        .register("push_image", PushImageHandler)
        .register("prepare_cluster", PrepareClusterHandler)
        .register("generate_k8s_manifests", GenerateManifestsHandler)
        .register("deploy_application", DeployApplicationHandler)
        .register("verify_deployment", VerifyDeploymentHandler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dockhand_domain::ToolGraph;

    #[test]
    fn test_default_registry_covers_the_whole_graph() {
        let registry = default_registry();
        let graph = ToolGraph::containerization();
        for name in graph.tool_names() {
            assert!(registry.has_tool(name), "no handler registered for {}", name);
        }
    }
}
