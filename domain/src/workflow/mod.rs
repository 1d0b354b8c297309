//! Workflow domain: step vocabulary, tool graph, and session state

pub mod graph;
pub mod state;
pub mod step;

pub use graph::{ExecutionReadiness, ToolGraph, ToolMetadata};
pub use state::WorkflowState;
pub use step::Step;
