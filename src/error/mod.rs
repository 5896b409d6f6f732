//! Two-level error taxonomy: [`WorkflowError`] for graph/run-entry problems,
//! [`NodeError`] for failures local to one node.

mod node_error;
mod workflow_error;

pub use node_error::NodeError;
pub use workflow_error::WorkflowError;

/// Crate-wide result alias for workflow-level operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
