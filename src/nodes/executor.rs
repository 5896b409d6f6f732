use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::core::context::ExecutionContext;
use crate::error::NodeError;
use crate::model::{Node, NodeKind};

/// Outcome of a single node invocation, as consumed by the dispatcher, the
/// builder UI's step-through mode, and tests.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeResult {
    pub success: bool,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl NodeResult {
    pub fn ok(output: Value) -> Self {
        NodeResult {
            success: true,
            output: Some(output),
            error: None,
        }
    }

    pub fn fail(error: impl std::fmt::Display) -> Self {
        NodeResult {
            success: false,
            output: None,
            error: Some(error.to_string()),
        }
    }
}

/// Trait for node execution. Each node kind maps to exactly one executor.
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    /// Execute the node against its (already variable-substituted) config,
    /// the inbound payload from upstream nodes, and the run's context.
    async fn execute(
        &self,
        node: &Node,
        input: &Value,
        context: &ExecutionContext,
    ) -> Result<Value, NodeError>;
}

/// Registry of node executors keyed by kind.
///
/// Kinds without a registered executor (`action`, `loop`, `processing` out
/// of the box) fail with the unknown-node-type error at execution time.
pub struct NodeExecutorRegistry {
    executors: HashMap<NodeKind, Arc<dyn NodeExecutor>>,
}

impl NodeExecutorRegistry {
    pub fn new() -> Self {
        let mut registry = NodeExecutorRegistry {
            executors: HashMap::new(),
        };
        registry.register(NodeKind::Trigger, Arc::new(super::control::TriggerExecutor));
        registry.register(
            NodeKind::Condition,
            Arc::new(super::control::ConditionExecutor),
        );
        registry.register(NodeKind::Delay, Arc::new(super::control::DelayExecutor));
        registry.register(
            NodeKind::Equipment,
            Arc::new(super::equipment::EquipmentExecutor),
        );
        registry.register(
            NodeKind::Imaging,
            Arc::new(super::equipment::ImagingExecutor),
        );
        registry.register(NodeKind::Script, Arc::new(super::script::ScriptExecutor));
        registry.register(
            NodeKind::Notification,
            Arc::new(super::notification::NotificationExecutor),
        );
        registry
    }

    pub fn register(&mut self, kind: NodeKind, executor: Arc<dyn NodeExecutor>) {
        self.executors.insert(kind, executor);
    }

    pub fn get(&self, kind: NodeKind) -> Option<Arc<dyn NodeExecutor>> {
        self.executors.get(&kind).cloned()
    }
}

impl Default for NodeExecutorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Dispatch one node through the registry, folding both "no executor" and
/// executor errors into a failed [`NodeResult`] so node failures never
/// propagate as `Err` past this boundary.
pub async fn execute_node(
    registry: &NodeExecutorRegistry,
    node: &Node,
    input: &Value,
    context: &ExecutionContext,
) -> NodeResult {
    let Some(executor) = registry.get(node.kind) else {
        return NodeResult::fail(NodeError::UnknownNodeType(node.kind.as_str().to_string()));
    };
    match executor.execute(node, input, context).await {
        Ok(output) => NodeResult::ok(output),
        Err(err) => NodeResult::fail(err),
    }
}
