//! # Cobalt Workflow — Astrophotography Session Automation
//!
//! `cobalt-workflow` is the workflow engine behind Cobalt Mobile's
//! automation builder. A workflow is a directed graph of typed nodes
//! (triggers, equipment actions, imaging sequences, conditions, scripts,
//! delays, notifications) connected by edges that may carry branch
//! handles. The engine:
//!
//! - **Validates** workflow structure: trigger presence, connection
//!   endpoints, orphaned nodes, per-type required config, and cycles.
//! - **Orders** nodes topologically, triggers first, for execution.
//! - **Substitutes** `${path}` placeholders in node config from the
//!   workflow's variable map, preserving value types.
//! - **Executes** runs through per-type async executors with retry,
//!   run-level timeout, conditional branch pruning, and configurable
//!   continue-or-abort failure handling.
//! - **Emits** lifecycle events (`workflow.started`, `node.executed`,
//!   `node.failed`, `branch.selected`, and terminal events) through an
//!   on/off observer bus.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use cobalt_workflow::{Connection, Node, NodeKind, WorkflowEngine, Workflow};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut workflow = Workflow::new("M31 session");
//!     workflow.nodes.push(Node::new("trigger1", NodeKind::Trigger));
//!     workflow.nodes.push(
//!         Node::new("capture", NodeKind::Imaging)
//!             .with_config("exposureTime", json!(300))
//!             .with_config("frameCount", json!(12)),
//!     );
//!     workflow
//!         .connections
//!         .push(Connection::new("c1", "trigger1", "capture"));
//!
//!     let engine = WorkflowEngine::new();
//!     let id = engine.add_workflow(workflow);
//!     let execution = engine.execute_workflow(id.as_str()).await.unwrap();
//!     println!("{:?}", execution.status);
//! }
//! ```

pub mod core;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod graph;
pub mod model;
pub mod nodes;

pub use crate::core::{EventBus, EventKind, ExecutionContext, ListenerId, WorkflowEvent};
pub use engine::{WorkflowEngine, WorkflowRef};
pub use error::{NodeError, WorkflowError, WorkflowResult};
pub use graph::{ValidationReport, WorkflowGraph};
pub use model::{
    Connection, ErrorHandling, Execution, ExecutionStatus, Node, NodeKind, StepRecord, StepStatus,
    Workflow, WorkflowSettings,
};
pub use nodes::{NodeExecutor, NodeExecutorRegistry, NodeResult};
