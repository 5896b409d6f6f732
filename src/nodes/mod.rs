//! Node executors: the trait, the kind-keyed registry, and the built-ins.

pub mod control;
pub mod equipment;
pub mod executor;
pub mod notification;
pub mod script;

pub use executor::{execute_node, NodeExecutor, NodeExecutorRegistry, NodeResult};
