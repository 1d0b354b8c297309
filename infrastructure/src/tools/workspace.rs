//! Workspace inspection
//!
//! Manifest-file sniffing shared by the analysis, base image, Dockerfile,
//! and manifest handlers. Detection is heuristic: the first recognized
//! manifest wins, and unrecognized workspaces fall back to "unknown".

use std::fs;
use std::path::Path;

/// What the workspace looks like to the containerization tools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoProfile {
    pub language: String,
    pub framework: Option<String>,
    pub build_system: String,
    /// Port the generated Dockerfile and Service will expose
    pub default_port: u16,
    pub has_dockerfile: bool,
}

/// Inspect a workspace root and classify its stack
pub fn inspect(root: &Path) -> RepoProfile {
    let has_dockerfile = root.join("Dockerfile").exists();
    let read = |name: &str| fs::read_to_string(root.join(name)).unwrap_or_default();

    let (language, framework, build_system, default_port) = if root.join("Cargo.toml").exists() {
        ("rust", None, "cargo", 8080)
    } else if root.join("go.mod").exists() {
        ("go", None, "go modules", 8080)
    } else if root.join("package.json").exists() {
        let manifest = read("package.json");
        let framework = if manifest.contains("\"next\"") {
            Some("next")
        } else if manifest.contains("\"express\"") {
            Some("express")
        } else if manifest.contains("\"fastify\"") {
            Some("fastify")
        } else {
            None
        };
        ("javascript", framework, "npm", 3000)
    } else if root.join("pom.xml").exists() {
        ("java", None, "maven", 8080)
    } else if root.join("build.gradle").exists() || root.join("build.gradle.kts").exists() {
        ("java", None, "gradle", 8080)
    } else if root.join("pyproject.toml").exists() || root.join("requirements.txt").exists() {
        let manifest = format!("{}{}", read("pyproject.toml"), read("requirements.txt"));
        let framework = if manifest.contains("django") {
            Some("django")
        } else if manifest.contains("fastapi") {
            Some("fastapi")
        } else if manifest.contains("flask") {
            Some("flask")
        } else {
            None
        };
        ("python", framework, "pip", 8000)
    } else {
        ("unknown", None, "unknown", 8080)
    };

    RepoProfile {
        language: language.to_string(),
        framework: framework.map(str::to_string),
        build_system: build_system.to_string(),
        default_port,
        has_dockerfile,
    }
}
