//! Domain layer for dockhand
//!
//! This crate contains the core business logic of the containerization
//! workflow: the step vocabulary, the static tool dependency graph with its
//! planning functions, and the per-session workflow state. It has no
//! dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Step
//!
//! A [`Step`](workflow::Step) is a named fact about a unit of work having
//! completed ("repository analyzed", "image built", ...). Steps form a
//! closed vocabulary and have no internal structure.
//!
//! ## Tool Graph
//!
//! The [`ToolGraph`](workflow::ToolGraph) maps each tool to the steps it
//! requires and the steps it produces, and answers two pure planning
//! questions: "what minimal ordered work reaches this tool?" and "is this
//! tool unblocked right now?". Exactly one tool is authoritative for
//! producing any given step, and the requires/produces relation is verified
//! acyclic at construction time.

pub mod error;
pub mod tool;
pub mod workflow;

// Re-export commonly used types
pub use error::DomainError;
pub use tool::{ToolError, ToolOutput};
pub use workflow::{
    graph::{ExecutionReadiness, ToolGraph, ToolMetadata},
    state::WorkflowState,
    step::Step,
};
