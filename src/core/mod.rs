//! Execution machinery: per-run context, variable substitution, the event
//! bus, and the run coordinator.

pub mod context;
pub mod dispatcher;
pub mod event_bus;
pub mod variables;

pub use context::ExecutionContext;
pub use dispatcher::WorkflowDispatcher;
pub use event_bus::{EventBus, EventKind, ListenerId, WorkflowEvent};
pub use variables::substitute_variables;
