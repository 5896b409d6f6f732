//! Canonical workflow, node, and execution-record types.

pub mod execution;
pub mod node;
pub mod workflow;

pub use execution::{Execution, ExecutionStatus, StepRecord, StepStatus};
pub use node::{Node, NodeKind};
pub use workflow::{Connection, ErrorHandling, Workflow, WorkflowSettings};
