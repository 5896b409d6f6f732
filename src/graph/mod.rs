//! Graph model, validation, and execution-order calculation.

pub mod builder;
pub mod traversal;
pub mod validator;

pub use builder::{build_graph, EdgeKind, GraphEdge, NodeIndexMap, WorkflowGraph};
pub use traversal::execution_order;
pub use validator::{validate_workflow, ValidationReport};
