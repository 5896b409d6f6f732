//! Engine facade.
//!
//! [`WorkflowEngine`] owns the workflow store, the executor registry, the
//! event bus, and the staged context data. It is the only type most
//! callers touch: register workflows, validate them, execute them, and
//! subscribe to lifecycle events.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::core::context::ExecutionContext;
use crate::core::dispatcher::WorkflowDispatcher;
use crate::core::event_bus::{EventBus, EventKind, ListenerId, WorkflowEvent};
use crate::core::variables;
use crate::error::{NodeError, WorkflowError, WorkflowResult};
use crate::graph::{self, ValidationReport};
use crate::model::{Execution, Node, NodeKind, Workflow};
use crate::nodes::{NodeExecutor, NodeExecutorRegistry, NodeResult};

/// A workflow to execute: either the id of a registered one or an inline
/// definition that is run without being stored.
pub enum WorkflowRef {
    Id(String),
    Inline(Workflow),
}

impl From<&str> for WorkflowRef {
    fn from(id: &str) -> Self {
        WorkflowRef::Id(id.to_string())
    }
}

impl From<String> for WorkflowRef {
    fn from(id: String) -> Self {
        WorkflowRef::Id(id)
    }
}

impl From<Workflow> for WorkflowRef {
    fn from(workflow: Workflow) -> Self {
        WorkflowRef::Inline(workflow)
    }
}

impl From<&Workflow> for WorkflowRef {
    fn from(workflow: &Workflow) -> Self {
        WorkflowRef::Inline(workflow.clone())
    }
}

#[derive(Default)]
pub struct WorkflowEngine {
    workflows: RwLock<HashMap<String, Workflow>>,
    executors: Arc<RwLock<NodeExecutorRegistry>>,
    events: EventBus,
    /// Values staged by [`set_context_data`](Self::set_context_data); each
    /// run starts from a snapshot of these.
    staged: ExecutionContext,
}

impl WorkflowEngine {
    pub fn new() -> Self {
        WorkflowEngine {
            workflows: RwLock::new(HashMap::new()),
            executors: Arc::new(RwLock::new(NodeExecutorRegistry::new())),
            events: EventBus::new(),
            staged: ExecutionContext::new(),
        }
    }

    /// Register a workflow, assigning an id when the definition has none.
    /// Returns the id it is stored under.
    pub fn add_workflow(&self, mut workflow: Workflow) -> String {
        if workflow.id.is_empty() {
            workflow.id = Uuid::new_v4().to_string();
        }
        let id = workflow.id.clone();
        tracing::debug!(workflow_id = %id, name = %workflow.name, "workflow registered");
        self.workflows.write().insert(id.clone(), workflow);
        id
    }

    pub fn get_workflow(&self, id: &str) -> Option<Workflow> {
        self.workflows.read().get(id).cloned()
    }

    pub fn remove_workflow(&self, id: &str) -> Option<Workflow> {
        self.workflows.write().remove(id)
    }

    pub fn list_workflows(&self) -> Vec<Workflow> {
        self.workflows.read().values().cloned().collect()
    }

    /// Structural validation: trigger presence, connection endpoints,
    /// orphans, required config fields, and cycles.
    pub fn validate_workflow(&self, workflow: &Workflow) -> ValidationReport {
        graph::validate_workflow(workflow)
    }

    /// Topological execution order, triggers first.
    pub fn execution_order(&self, workflow: &Workflow) -> WorkflowResult<Vec<String>> {
        graph::execution_order(workflow)
    }

    /// Replace `${...}` placeholders in a node's config from the workflow
    /// variable map.
    pub fn substitute_variables(&self, node: &Node, variables: &HashMap<String, Value>) -> Node {
        variables::substitute_variables(node, variables)
    }

    /// Execute one node outside any run, against the given context.
    pub async fn execute_node(
        &self,
        node: &Node,
        input: &Value,
        context: &ExecutionContext,
    ) -> NodeResult {
        let executor = self.executors.read().get(node.kind);
        let Some(executor) = executor else {
            return NodeResult::fail(NodeError::UnknownNodeType(node.kind.as_str().to_string()));
        };
        match executor.execute(node, input, context).await {
            Ok(output) => NodeResult::ok(output),
            Err(err) => NodeResult::fail(err),
        }
    }

    /// Execute a workflow to a terminal state.
    ///
    /// Fails fast (as `Err`) when the workflow is unknown, disabled,
    /// structurally invalid, or cyclic. Once a run starts, node failures
    /// are recorded in the returned [`Execution`] instead.
    pub async fn execute_workflow(
        &self,
        workflow: impl Into<WorkflowRef>,
    ) -> WorkflowResult<Execution> {
        let workflow = match workflow.into() {
            WorkflowRef::Id(id) => {
                let found = self.workflows.read().get(&id).cloned();
                found.ok_or(WorkflowError::WorkflowNotFound(id))?
            }
            WorkflowRef::Inline(workflow) => workflow,
        };
        if !workflow.enabled {
            return Err(WorkflowError::Disabled(workflow.id));
        }
        let report = graph::validate_workflow(&workflow);
        if !report.is_valid {
            return Err(WorkflowError::ValidationFailed(report.errors));
        }
        let order = graph::execution_order(&workflow)?;
        let built = graph::build_graph(&workflow)?;
        let dispatcher = WorkflowDispatcher::new(
            &workflow,
            built,
            order,
            self.executors.clone(),
            self.events.clone(),
            ExecutionContext::seeded(self.staged.snapshot()),
        );
        Ok(dispatcher.run().await)
    }

    /// Swap in (or add) the executor for a node kind. Later runs pick it
    /// up; a run already in flight keeps whatever it resolves per node.
    pub fn register_executor(&self, kind: NodeKind, executor: Arc<dyn NodeExecutor>) {
        self.executors.write().register(kind, executor);
    }

    /// Stage a context value under a dotted path. Every subsequent run
    /// starts with a copy; run-time mutations never write back here.
    pub fn set_context_data(&self, path: &str, value: Value) {
        self.staged.set(path, value);
    }

    pub fn get_context_data(&self, path: &str) -> Option<Value> {
        self.staged.get(path)
    }

    pub fn context_snapshot(&self) -> Map<String, Value> {
        self.staged.snapshot()
    }

    /// Subscribe to a lifecycle event kind.
    pub fn on<F>(&self, kind: EventKind, handler: F) -> ListenerId
    where
        F: Fn(&WorkflowEvent) + Send + Sync + 'static,
    {
        self.events.on(kind, handler)
    }

    /// Unsubscribe a handler by the id `on` returned.
    pub fn off(&self, kind: EventKind, id: ListenerId) -> bool {
        self.events.off(kind, id)
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Connection, NodeKind};
    use serde_json::json;

    fn trigger_only_workflow(id: &str) -> Workflow {
        let mut wf = Workflow::new("test");
        wf.id = id.to_string();
        wf.nodes.push(Node::new("trigger1", NodeKind::Trigger));
        wf
    }

    #[test]
    fn test_add_workflow_assigns_id_when_missing() {
        let engine = WorkflowEngine::new();
        let id = engine.add_workflow(trigger_only_workflow(""));
        assert!(!id.is_empty());
        assert!(engine.get_workflow(&id).is_some());
    }

    #[test]
    fn test_remove_workflow() {
        let engine = WorkflowEngine::new();
        let id = engine.add_workflow(trigger_only_workflow("wf1"));
        assert_eq!(id, "wf1");
        assert!(engine.remove_workflow("wf1").is_some());
        assert!(engine.get_workflow("wf1").is_none());
    }

    #[tokio::test]
    async fn test_execute_unknown_workflow() {
        let engine = WorkflowEngine::new();
        let err = engine.execute_workflow("missing").await.unwrap_err();
        assert!(matches!(err, WorkflowError::WorkflowNotFound(_)));
    }

    #[tokio::test]
    async fn test_execute_disabled_workflow() {
        let engine = WorkflowEngine::new();
        let mut wf = trigger_only_workflow("wf1");
        wf.enabled = false;
        engine.add_workflow(wf);
        let err = engine.execute_workflow("wf1").await.unwrap_err();
        assert!(matches!(err, WorkflowError::Disabled(_)));
    }

    #[tokio::test]
    async fn test_execute_invalid_workflow() {
        let engine = WorkflowEngine::new();
        let mut wf = Workflow::new("no trigger");
        wf.id = "wf1".to_string();
        wf.nodes.push(
            Node::new("notify1", NodeKind::Notification).with_config("message", json!("hi")),
        );
        let err = engine.execute_workflow(wf).await.unwrap_err();
        let WorkflowError::ValidationFailed(errors) = err else {
            panic!("expected validation failure");
        };
        assert!(errors
            .iter()
            .any(|e| e.contains("at least one trigger node")));
    }

    #[tokio::test]
    async fn test_execute_inline_workflow() {
        let engine = WorkflowEngine::new();
        let mut wf = trigger_only_workflow("inline");
        wf.nodes.push(
            Node::new("notify1", NodeKind::Notification).with_config("message", json!("done")),
        );
        wf.connections
            .push(Connection::new("c1", "trigger1", "notify1"));
        let execution = engine.execute_workflow(&wf).await.unwrap();
        assert_eq!(execution.workflow_id, "inline");
        assert_eq!(execution.steps.len(), 2);
    }
}
