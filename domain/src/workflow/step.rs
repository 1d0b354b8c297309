//! Step vocabulary
//!
//! A [`Step`] is a named fact about a unit of work having completed. The
//! vocabulary is closed: every step a tool can require or produce is listed
//! here, and identity is by value.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A named fact representing a unit of completed work
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// The repository has been analyzed (language, framework, ports)
    AnalyzedRepo,
    /// Base images have been recommended for the detected stack
    ResolvedBaseImages,
    /// A Dockerfile has been generated into the workspace
    DockerfileGenerated,
    /// The container image has been built
    BuiltImage,
    /// The built image has been scanned for vulnerabilities
    ScannedImage,
    /// The built image has been pushed to a registry
    PushedImage,
    /// The target cluster/namespace is ready to receive workloads
    K8sPrepared,
    /// Kubernetes manifests have been generated
    ManifestsGenerated,
    /// The application has been deployed to the cluster
    Deployed,
    /// The deployment has been verified healthy
    DeploymentVerified,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::AnalyzedRepo => "analyzed_repo",
            Step::ResolvedBaseImages => "resolved_base_images",
            Step::DockerfileGenerated => "dockerfile_generated",
            Step::BuiltImage => "built_image",
            Step::ScannedImage => "scanned_image",
            Step::PushedImage => "pushed_image",
            Step::K8sPrepared => "k8s_prepared",
            Step::ManifestsGenerated => "manifests_generated",
            Step::Deployed => "deployed",
            Step::DeploymentVerified => "deployment_verified",
        }
    }

    /// All steps in the vocabulary, in declaration order
    pub fn all() -> &'static [Step] {
        &[
            Step::AnalyzedRepo,
            Step::ResolvedBaseImages,
            Step::DockerfileGenerated,
            Step::BuiltImage,
            Step::ScannedImage,
            Step::PushedImage,
            Step::K8sPrepared,
            Step::ManifestsGenerated,
            Step::Deployed,
            Step::DeploymentVerified,
        ]
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Step::all()
            .iter()
            .find(|step| step.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Unknown step: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_round_trip() {
        for step in Step::all() {
            assert_eq!(step.as_str().parse::<Step>().unwrap(), *step);
        }
    }

    #[test]
    fn test_step_unknown() {
        assert!("not_a_step".parse::<Step>().is_err());
    }

    #[test]
    fn test_step_serde_snake_case() {
        let json = serde_json::to_string(&Step::BuiltImage).unwrap();
        assert_eq!(json, "\"built_image\"");
        let step: Step = serde_json::from_str("\"analyzed_repo\"").unwrap();
        assert_eq!(step, Step::AnalyzedRepo);
    }
}
