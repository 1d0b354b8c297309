//! Tool dependency graph and planning
//!
//! The [`ToolGraph`] is the static metadata side of the tool system: for
//! every tool it records which steps must already hold before the tool may
//! run (`requires`) and which steps the tool establishes on success
//! (`produces`), plus a reverse index from each step to the single tool that
//! produces it.
//!
//! The graph is deliberately decoupled from the runtime handler registry.
//! Planning always succeeds for tools the graph knows about, even when a
//! handler was never registered; only execution reports "Tool not found".
//!
//! # Planning
//!
//! [`compute_plan`](ToolGraph::compute_plan) answers "what minimal ordered
//! work reaches this tool?" via a depth-first traversal of the induced
//! subgraph of unmet work. [`can_execute`](ToolGraph::can_execute) answers
//! the shallower question "is this tool unblocked right now?" by checking
//! only the direct requirements.

use crate::error::DomainError;
use crate::workflow::step::Step;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Static metadata for a single tool: its preconditions and effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolMetadata {
    /// Unique name of the tool (e.g., "build_image")
    pub name: String,
    /// Steps that must already hold before this tool may run
    pub requires: BTreeSet<Step>,
    /// Steps this tool establishes on success
    pub produces: BTreeSet<Step>,
}

impl ToolMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requires: BTreeSet::new(),
            produces: BTreeSet::new(),
        }
    }

    pub fn with_requires(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.requires.extend(steps);
        self
    }

    pub fn with_produces(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.produces.extend(steps);
        self
    }
}

/// Answer to a "can this tool run now" query
///
/// Only the tool's *direct* requirements are consulted, never their
/// transitive producer chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReadiness {
    pub can_execute: bool,
    /// Direct requirements not yet satisfied, in stable step order
    pub missing_steps: Vec<Step>,
}

/// Static tool dependency graph with pure planning functions
///
/// Immutable after construction. Constructed once at startup and shared by
/// reference into the router; there is no hidden global instance.
#[derive(Debug, Clone)]
pub struct ToolGraph {
    tools: HashMap<String, ToolMetadata>,
    /// Reverse index: step -> the single tool that produces it
    producers: HashMap<Step, String>,
}

impl ToolGraph {
    /// Build a graph from tool metadata, validating the producer mapping and
    /// rejecting dependency cycles.
    ///
    /// Validation runs here, at construction time, so that planning can
    /// never loop or dead-end lazily:
    ///
    /// - every step is produced by exactly one tool
    /// - every required step has a producer
    /// - no step transitively requires itself via its producer chain
    pub fn new(specs: impl IntoIterator<Item = ToolMetadata>) -> Result<Self, DomainError> {
        let mut tools = HashMap::new();
        let mut producers: HashMap<Step, String> = HashMap::new();

        for spec in specs {
            for &step in &spec.produces {
                if let Some(first) = producers.get(&step) {
                    return Err(DomainError::DuplicateProducer {
                        step,
                        first: first.clone(),
                        second: spec.name.clone(),
                    });
                }
                producers.insert(step, spec.name.clone());
            }
            tools.insert(spec.name.clone(), spec);
        }

        for spec in tools.values() {
            for &step in &spec.requires {
                if !producers.contains_key(&step) {
                    return Err(DomainError::MissingProducer {
                        step,
                        required_by: spec.name.clone(),
                    });
                }
            }
        }

        let graph = Self { tools, producers };
        graph.check_acyclic()?;
        Ok(graph)
    }

    /// The default containerization workflow graph
    pub fn containerization() -> Self {
        let specs = vec![
            ToolMetadata::new("analyze_repo").with_produces([Step::AnalyzedRepo]),
            ToolMetadata::new("resolve_base_images")
                .with_requires([Step::AnalyzedRepo])
                .with_produces([Step::ResolvedBaseImages]),
            ToolMetadata::new("generate_dockerfile")
                .with_requires([Step::ResolvedBaseImages])
                .with_produces([Step::DockerfileGenerated]),
            ToolMetadata::new("build_image")
                .with_requires([Step::DockerfileGenerated])
                .with_produces([Step::BuiltImage]),
            ToolMetadata::new("scan_image")
                .with_requires([Step::BuiltImage])
                .with_produces([Step::ScannedImage]),
            ToolMetadata::new("push_image")
                .with_requires([Step::BuiltImage])
                .with_produces([Step::PushedImage]),
            ToolMetadata::new("prepare_cluster").with_produces([Step::K8sPrepared]),
            ToolMetadata::new("generate_k8s_manifests")
                .with_requires([Step::AnalyzedRepo])
                .with_produces([Step::ManifestsGenerated]),
            ToolMetadata::new("deploy_application")
                .with_requires([Step::PushedImage, Step::ManifestsGenerated, Step::K8sPrepared])
                .with_produces([Step::Deployed]),
            ToolMetadata::new("verify_deployment")
                .with_requires([Step::Deployed])
                .with_produces([Step::DeploymentVerified]),
        ];

        // The built-in graph is validated by tests; a panic here would be a
        // programming error in the table above, not a runtime condition.
        Self::new(specs).expect("built-in containerization graph is valid")
    }

    /// Get the metadata for a tool
    pub fn metadata(&self, name: &str) -> Option<&ToolMetadata> {
        self.tools.get(name)
    }

    /// Resolve the single tool that produces a step
    pub fn producer_of(&self, step: Step) -> Option<&str> {
        self.producers.get(&step).map(|s| s.as_str())
    }

    /// Names of all tools in the graph, sorted
    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Compute the minimal, dependency-respecting, duplicate-free sequence
    /// of tool names (ending with `target`) needed to establish `target`'s
    /// effects, treating every step in `completed` as satisfied.
    ///
    /// This is a reachability computation over the induced subgraph of unmet
    /// work, not a full topological sort: branches whose steps are already
    /// satisfied are never visited. The per-call visited set guarantees each
    /// tool appears at most once even when required by multiple dependents.
    ///
    /// No idempotency filtering is applied to the target's own effects;
    /// callers short-circuit already-satisfied targets before planning.
    pub fn compute_plan(
        &self,
        target: &str,
        completed: &BTreeSet<Step>,
    ) -> Result<Vec<String>, DomainError> {
        let mut visited = HashSet::new();
        let mut plan = Vec::new();
        self.visit(target, completed, &mut visited, &mut plan)?;
        Ok(plan)
    }

    fn visit(
        &self,
        name: &str,
        completed: &BTreeSet<Step>,
        visited: &mut HashSet<String>,
        plan: &mut Vec<String>,
    ) -> Result<(), DomainError> {
        if !visited.insert(name.to_string()) {
            return Ok(());
        }

        let meta = self
            .tools
            .get(name)
            .ok_or_else(|| DomainError::UnknownTool(name.to_string()))?;

        for &step in &meta.requires {
            if completed.contains(&step) {
                continue;
            }
            // Producer existence is guaranteed by construction.
            let producer = self.producers.get(&step).ok_or(DomainError::MissingProducer {
                step,
                required_by: name.to_string(),
            })?;
            self.visit(producer, completed, visited, plan)?;
        }

        plan.push(name.to_string());
        Ok(())
    }

    /// Check only the *direct* requirements of `target` against `completed`.
    pub fn can_execute(
        &self,
        target: &str,
        completed: &BTreeSet<Step>,
    ) -> Result<ExecutionReadiness, DomainError> {
        let meta = self
            .tools
            .get(target)
            .ok_or_else(|| DomainError::UnknownTool(target.to_string()))?;

        let missing_steps: Vec<Step> = meta
            .requires
            .iter()
            .copied()
            .filter(|step| !completed.contains(step))
            .collect();

        Ok(ExecutionReadiness {
            can_execute: missing_steps.is_empty(),
            missing_steps,
        })
    }

    /// Depth-first cycle check over the tool -> producer edges
    fn check_acyclic(&self) -> Result<(), DomainError> {
        let mut state: HashMap<&str, VisitState> = HashMap::new();

        for name in self.tools.keys() {
            if !state.contains_key(name.as_str()) {
                let mut stack = Vec::new();
                self.dfs_cycle(name, &mut state, &mut stack)?;
            }
        }
        Ok(())
    }

    fn dfs_cycle<'a>(
        &'a self,
        name: &'a str,
        state: &mut HashMap<&'a str, VisitState>,
        stack: &mut Vec<&'a str>,
    ) -> Result<(), DomainError> {
        match state.get(name) {
            Some(VisitState::Done) => return Ok(()),
            Some(VisitState::InProgress) => {
                let start = stack.iter().position(|n| *n == name).unwrap_or(0);
                let mut path: Vec<&str> = stack[start..].to_vec();
                path.push(name);
                return Err(DomainError::CycleDetected(path.join(" -> ")));
            }
            None => {}
        }

        state.insert(name, VisitState::InProgress);
        stack.push(name);

        if let Some(meta) = self.tools.get(name) {
            for &step in &meta.requires {
                if let Some(producer) = self.producers.get(&step) {
                    self.dfs_cycle(producer, state, stack)?;
                }
            }
        }

        stack.pop();
        state.insert(name, VisitState::Done);
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    InProgress,
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(steps: impl IntoIterator<Item = Step>) -> BTreeSet<Step> {
        steps.into_iter().collect()
    }

    #[test]
    fn test_containerization_graph_builds() {
        let graph = ToolGraph::containerization();
        assert_eq!(graph.tool_names().len(), 10);
        assert_eq!(graph.producer_of(Step::BuiltImage), Some("build_image"));
        assert_eq!(graph.producer_of(Step::Deployed), Some("deploy_application"));
    }

    #[test]
    fn test_plan_full_chain_from_empty_session() {
        let graph = ToolGraph::containerization();
        let plan = graph.compute_plan("build_image", &BTreeSet::new()).unwrap();
        assert_eq!(
            plan,
            vec![
                "analyze_repo",
                "resolve_base_images",
                "generate_dockerfile",
                "build_image"
            ]
        );
    }

    #[test]
    fn test_plan_skips_satisfied_steps() {
        let graph = ToolGraph::containerization();
        let plan = graph
            .compute_plan("build_image", &completed([Step::AnalyzedRepo]))
            .unwrap();
        assert_eq!(
            plan,
            vec!["resolve_base_images", "generate_dockerfile", "build_image"]
        );
    }

    #[test]
    fn test_plan_target_only_when_direct_requires_met() {
        let graph = ToolGraph::containerization();
        let plan = graph
            .compute_plan("build_image", &completed([Step::DockerfileGenerated]))
            .unwrap();
        assert_eq!(plan, vec!["build_image"]);
    }

    #[test]
    fn test_plan_diamond_dedups_shared_producer() {
        // deploy_application reaches analyze_repo through two branches:
        // push_image -> ... -> analyze_repo and generate_k8s_manifests ->
        // analyze_repo. The shared producer must appear exactly once.
        let graph = ToolGraph::containerization();
        let plan = graph
            .compute_plan("deploy_application", &BTreeSet::new())
            .unwrap();

        let analyze_count = plan.iter().filter(|n| *n == "analyze_repo").count();
        assert_eq!(analyze_count, 1);
        assert_eq!(plan.last().map(|s| s.as_str()), Some("deploy_application"));

        let dedup: HashSet<&String> = plan.iter().collect();
        assert_eq!(dedup.len(), plan.len(), "plan contains duplicates: {:?}", plan);
    }

    #[test]
    fn test_plan_order_invariant() {
        // Every producer of a step a tool requires appears strictly before
        // that tool.
        let graph = ToolGraph::containerization();
        let plan = graph
            .compute_plan("verify_deployment", &BTreeSet::new())
            .unwrap();

        let position = |name: &str| plan.iter().position(|n| n == name);
        for name in &plan {
            let meta = graph.metadata(name).unwrap();
            for &step in &meta.requires {
                let producer = graph.producer_of(step).unwrap();
                assert!(
                    position(producer) < position(name),
                    "{} must run before {} in {:?}",
                    producer,
                    name,
                    plan
                );
            }
        }
    }

    #[test]
    fn test_plan_irrelevant_branches_not_visited() {
        // scan_image is not needed to push, so it never enters the plan.
        let graph = ToolGraph::containerization();
        let plan = graph.compute_plan("push_image", &BTreeSet::new()).unwrap();
        assert!(!plan.contains(&"scan_image".to_string()));
    }

    #[test]
    fn test_plan_unknown_tool() {
        let graph = ToolGraph::containerization();
        let err = graph.compute_plan("mystery", &BTreeSet::new()).unwrap_err();
        assert_eq!(err, DomainError::UnknownTool("mystery".to_string()));
    }

    #[test]
    fn test_can_execute_checks_direct_requires_only() {
        let graph = ToolGraph::containerization();
        let readiness = graph
            .can_execute("build_image", &completed([Step::AnalyzedRepo]))
            .unwrap();

        // build_image directly requires only dockerfile_generated; the
        // transitive resolved_base_images must not be reported.
        assert!(!readiness.can_execute);
        assert_eq!(readiness.missing_steps, vec![Step::DockerfileGenerated]);
    }

    #[test]
    fn test_can_execute_unblocked() {
        let graph = ToolGraph::containerization();
        let readiness = graph
            .can_execute("build_image", &completed([Step::DockerfileGenerated]))
            .unwrap();
        assert!(readiness.can_execute);
        assert!(readiness.missing_steps.is_empty());
    }

    #[test]
    fn test_duplicate_producer_rejected() {
        let err = ToolGraph::new(vec![
            ToolMetadata::new("build_image").with_produces([Step::BuiltImage]),
            ToolMetadata::new("rebuild_image").with_produces([Step::BuiltImage]),
        ])
        .unwrap_err();

        assert!(matches!(
            err,
            DomainError::DuplicateProducer {
                step: Step::BuiltImage,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_producer_rejected() {
        let err = ToolGraph::new(vec![
            ToolMetadata::new("build_image")
                .with_requires([Step::DockerfileGenerated])
                .with_produces([Step::BuiltImage]),
        ])
        .unwrap_err();

        assert!(matches!(
            err,
            DomainError::MissingProducer {
                step: Step::DockerfileGenerated,
                ..
            }
        ));
    }

    #[test]
    fn test_cycle_detected_at_construction() {
        // a requires built_image (from b), b requires analyzed_repo (from a)
        let err = ToolGraph::new(vec![
            ToolMetadata::new("a")
                .with_requires([Step::BuiltImage])
                .with_produces([Step::AnalyzedRepo]),
            ToolMetadata::new("b")
                .with_requires([Step::AnalyzedRepo])
                .with_produces([Step::BuiltImage]),
        ])
        .unwrap_err();

        match err {
            DomainError::CycleDetected(path) => {
                assert!(path.contains(" -> "), "cycle path missing: {}", path);
            }
            other => panic!("expected CycleDetected, got {:?}", other),
        }
    }

    #[test]
    fn test_self_cycle_detected() {
        let err = ToolGraph::new(vec![ToolMetadata::new("ouroboros")
            .with_requires([Step::BuiltImage])
            .with_produces([Step::BuiltImage])])
        .unwrap_err();

        assert!(matches!(err, DomainError::CycleDetected(_)));
    }
}
