//! Workflow-level error types.

use thiserror::Error;

use super::NodeError;

/// Errors surfaced before or outside node execution. Node-level failures
/// during a run are recorded on the execution instead of propagating here.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Workflow not found: {0}")]
    WorkflowNotFound(String),
    #[error("Workflow is disabled: {0}")]
    Disabled(String),
    #[error("Workflow validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),
    #[error("Circular dependency detected")]
    CycleDetected,
    #[error("Graph build error: {0}")]
    GraphBuildError(String),
    #[error("Node not found: {0}")]
    NodeNotFound(String),
    #[error("Node error: {0}")]
    NodeError(Box<NodeError>),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<NodeError> for WorkflowError {
    fn from(value: NodeError) -> Self {
        WorkflowError::NodeError(Box::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message() {
        assert_eq!(
            WorkflowError::CycleDetected.to_string(),
            "Circular dependency detected"
        );
    }

    #[test]
    fn test_validation_failed_joins_errors() {
        let err = WorkflowError::ValidationFailed(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "Workflow validation failed: a; b");
    }

    #[test]
    fn test_from_node_error() {
        let err: WorkflowError = NodeError::ExecutionError("boom".into()).into();
        assert!(matches!(err, WorkflowError::NodeError(_)));
        assert!(err.to_string().contains("boom"));
    }
}
