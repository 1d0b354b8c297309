//! Domain error types

use crate::workflow::step::Step;
use thiserror::Error;

/// Domain-level errors
///
/// Graph construction errors (`DuplicateProducer`, `MissingProducer`,
/// `CycleDetected`) are fatal at startup and never surfaced per-request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Step '{step}' is produced by both '{first}' and '{second}'")]
    DuplicateProducer {
        step: Step,
        first: String,
        second: String,
    },

    #[error("Step '{step}' required by '{required_by}' has no producer")]
    MissingProducer { step: Step, required_by: String },

    #[error("Dependency cycle detected: {0}")]
    CycleDetected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tool_display() {
        let error = DomainError::UnknownTool("mystery".to_string());
        assert_eq!(error.to_string(), "Unknown tool: mystery");
    }

    #[test]
    fn test_duplicate_producer_display() {
        let error = DomainError::DuplicateProducer {
            step: Step::BuiltImage,
            first: "build_image".to_string(),
            second: "rebuild_image".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Step 'built_image' is produced by both 'build_image' and 'rebuild_image'"
        );
    }
}
