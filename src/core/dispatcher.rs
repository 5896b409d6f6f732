//! Run coordinator.
//!
//! [`WorkflowDispatcher`] drives one execution end to end: it walks the
//! precomputed topological order, substitutes variables, invokes the
//! matching executor with per-node retry, prunes branches not selected by
//! condition nodes, records step outcomes, enforces the run-wide timeout,
//! and emits lifecycle events. Node failures are contained here as step
//! records rather than surfacing as `Err`, so the returned [`Execution`]
//! always describes what happened.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tokio::time::{sleep, timeout, Duration};
use uuid::Uuid;

use crate::core::context::ExecutionContext;
use crate::core::event_bus::{EventBus, WorkflowEvent};
use crate::core::variables::substitute_variables;
use crate::graph::{EdgeKind, WorkflowGraph};
use crate::model::{
    ErrorHandling, Execution, ExecutionStatus, Node, NodeKind, StepRecord, StepStatus, Workflow,
};
use crate::nodes::{NodeExecutorRegistry, NodeResult};

/// Pause between retry attempts. Fixed backoff; the retry contract only
/// promises that retries happen, not a curve.
const RETRY_PAUSE: Duration = Duration::from_millis(100);

enum WalkOutcome {
    Completed,
    Failed(String),
    Aborted(String),
    TimedOut(String),
}

struct RunState {
    steps: Vec<StepRecord>,
    outputs: HashMap<String, Value>,
    /// Nodes activated by an inbound edge (or in-degree zero). A node that
    /// never becomes active was pruned and gets no step record.
    active: HashSet<String>,
    first_failure: Option<String>,
}

pub struct WorkflowDispatcher<'a> {
    workflow: &'a Workflow,
    graph: WorkflowGraph,
    order: Vec<String>,
    executors: Arc<RwLock<NodeExecutorRegistry>>,
    events: EventBus,
    context: ExecutionContext,
}

impl<'a> WorkflowDispatcher<'a> {
    pub fn new(
        workflow: &'a Workflow,
        graph: WorkflowGraph,
        order: Vec<String>,
        executors: Arc<RwLock<NodeExecutorRegistry>>,
        events: EventBus,
        context: ExecutionContext,
    ) -> Self {
        WorkflowDispatcher {
            workflow,
            graph,
            order,
            executors,
            events,
            context,
        }
    }

    /// Run to a terminal state. The returned execution is final; the
    /// context is dropped with the dispatcher.
    pub async fn run(self) -> Execution {
        let execution_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        tracing::debug!(
            execution_id = %execution_id,
            workflow_id = %self.workflow.id,
            nodes = self.order.len(),
            "workflow run started"
        );
        self.events.emit(WorkflowEvent::WorkflowStarted {
            execution_id: execution_id.clone(),
            workflow_id: self.workflow.id.clone(),
            timestamp: started_at,
        });

        let mut state = RunState {
            steps: Vec::new(),
            outputs: HashMap::new(),
            active: self
                .order
                .iter()
                .filter(|id| self.graph.in_degree(id) == 0)
                .cloned()
                .collect(),
            first_failure: None,
        };

        let budget = Duration::from_secs(self.workflow.settings.timeout);
        let outcome = match timeout(budget, self.walk(&execution_id, &mut state)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(execution_id = %execution_id, timeout_secs = self.workflow.settings.timeout, "workflow run timed out");
                WalkOutcome::TimedOut(format!(
                    "Workflow execution timed out after {}s",
                    self.workflow.settings.timeout
                ))
            }
        };

        let (status, error) = match outcome {
            WalkOutcome::Completed => (ExecutionStatus::Completed, None),
            WalkOutcome::Failed(error) => (ExecutionStatus::Failed, Some(error)),
            WalkOutcome::Aborted(reason) => (ExecutionStatus::Aborted, Some(reason)),
            WalkOutcome::TimedOut(error) => (ExecutionStatus::TimedOut, Some(error)),
        };

        let finished_at = Utc::now();
        match status {
            ExecutionStatus::Completed => self.events.emit(WorkflowEvent::WorkflowCompleted {
                execution_id: execution_id.clone(),
                workflow_id: self.workflow.id.clone(),
                timestamp: finished_at,
            }),
            ExecutionStatus::Aborted => self.events.emit(WorkflowEvent::WorkflowAborted {
                execution_id: execution_id.clone(),
                workflow_id: self.workflow.id.clone(),
                reason: error.clone().unwrap_or_default(),
                timestamp: finished_at,
            }),
            _ => self.events.emit(WorkflowEvent::WorkflowFailed {
                execution_id: execution_id.clone(),
                workflow_id: self.workflow.id.clone(),
                error: error.clone().unwrap_or_default(),
                timestamp: finished_at,
            }),
        }

        Execution {
            id: execution_id,
            workflow_id: self.workflow.id.clone(),
            status,
            started_at,
            finished_at: Some(finished_at),
            steps: state.steps,
            variables: self.workflow.variables.clone(),
            error,
        }
    }

    async fn walk(&self, execution_id: &str, state: &mut RunState) -> WalkOutcome {
        for node_id in &self.order {
            if !state.active.contains(node_id) {
                tracing::debug!(node_id = %node_id, "node pruned, skipping");
                continue;
            }
            let Ok(node) = self.graph.node(node_id) else {
                // Order and graph come from the same definition.
                continue;
            };

            let substituted = substitute_variables(node, &self.workflow.variables);
            let input = self.inbound_payload(node_id, state);
            let step_started = Utc::now();
            let (result, attempts) = self.execute_with_retry(&substituted, &input).await;
            let step_finished = Utc::now();

            state.steps.push(StepRecord {
                node_id: node_id.clone(),
                status: if result.success {
                    StepStatus::Completed
                } else {
                    StepStatus::Failed
                },
                output: result.output.clone(),
                error: result.error.clone(),
                attempts,
                started_at: step_started,
                finished_at: step_finished,
            });
            self.events.emit(WorkflowEvent::NodeExecuted {
                execution_id: execution_id.to_string(),
                node_id: node_id.clone(),
                success: result.success,
                output: result.output.clone(),
                timestamp: step_finished,
            });

            if result.success {
                let output = result.output.unwrap_or(Value::Null);
                if node.kind == NodeKind::Condition {
                    if let Some(reason) =
                        self.route_condition(execution_id, node_id, &output, state)
                    {
                        return WalkOutcome::Aborted(reason);
                    }
                } else {
                    for succ in self.graph.successors(node_id) {
                        state.active.insert(succ);
                    }
                }
                state.outputs.insert(node_id.clone(), output);
                continue;
            }

            let error = result
                .error
                .unwrap_or_else(|| "node execution failed".to_string());
            self.events.emit(WorkflowEvent::NodeFailed {
                execution_id: execution_id.to_string(),
                node_id: node_id.clone(),
                error: error.clone(),
                timestamp: step_finished,
            });
            let error = format!("Node {node_id} failed: {error}");
            match self.workflow.settings.error_handling {
                ErrorHandling::Abort => return WalkOutcome::Failed(error),
                ErrorHandling::Continue => {
                    state.first_failure.get_or_insert(error);
                    // Downstream nodes still run under the continue policy.
                    for succ in self.graph.successors(node_id) {
                        state.active.insert(succ);
                    }
                }
            }
        }

        match state.first_failure.take() {
            Some(error) => WalkOutcome::Failed(error),
            None => WalkOutcome::Completed,
        }
    }

    /// Follow only the outgoing connections whose handle matches the
    /// condition result. Returns an abort reason when branches exist but
    /// none match (the declared halt path for a false branch with no
    /// wiring).
    fn route_condition(
        &self,
        execution_id: &str,
        node_id: &str,
        output: &Value,
        state: &mut RunState,
    ) -> Option<String> {
        let branch = output
            .get("conditionResult")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let wanted = if branch {
            EdgeKind::TrueBranch
        } else {
            EdgeKind::FalseBranch
        };
        self.events.emit(WorkflowEvent::BranchSelected {
            execution_id: execution_id.to_string(),
            node_id: node_id.to_string(),
            branch: branch.to_string(),
            timestamp: Utc::now(),
        });

        let outgoing = self.graph.outgoing(node_id);
        if outgoing.is_empty() {
            return None;
        }
        let mut followed = false;
        for edge in &outgoing {
            if edge.kind == wanted || edge.kind == EdgeKind::Normal {
                state.active.insert(edge.target.clone());
                followed = true;
            }
        }
        if followed {
            None
        } else {
            Some(format!(
                "Condition {node_id} has no outgoing '{branch}' branch"
            ))
        }
    }

    async fn execute_with_retry(&self, node: &Node, input: &Value) -> (NodeResult, u32) {
        let retry_attempts = self.workflow.settings.retry_attempts;
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let result = self.execute_once(node, input).await;
            if result.success || attempts > retry_attempts {
                return (result, attempts);
            }
            tracing::debug!(
                node_id = %node.id,
                attempt = attempts,
                max_attempts = retry_attempts + 1,
                "node failed, retrying"
            );
            sleep(RETRY_PAUSE).await;
        }
    }

    async fn execute_once(&self, node: &Node, input: &Value) -> NodeResult {
        // Snapshot the executor before awaiting so the registry lock is
        // never held across a suspension point.
        let executor = self.executors.read().get(node.kind);
        let Some(executor) = executor else {
            return NodeResult::fail(crate::error::NodeError::UnknownNodeType(
                node.kind.as_str().to_string(),
            ));
        };
        match executor.execute(node, input, &self.context).await {
            Ok(output) => NodeResult::ok(output),
            Err(err) => NodeResult::fail(err),
        }
    }

    /// Merge the outputs of executed predecessors, in connection order.
    /// Object outputs merge key-wise (later keys win); anything else, the
    /// last one wins wholesale.
    fn inbound_payload(&self, node_id: &str, state: &RunState) -> Value {
        let mut sources: Vec<&Value> = Vec::new();
        for conn in &self.workflow.connections {
            if conn.target == node_id {
                if let Some(output) = state.outputs.get(&conn.source) {
                    sources.push(output);
                }
            }
        }
        match sources.len() {
            0 => Value::Null,
            1 => sources[0].clone(),
            _ => {
                let mut merged = Map::new();
                let mut last_scalar = None;
                for source in sources {
                    match source {
                        Value::Object(map) => {
                            for (k, v) in map {
                                merged.insert(k.clone(), v.clone());
                            }
                        }
                        other => last_scalar = Some(other.clone()),
                    }
                }
                if merged.is_empty() {
                    last_scalar.unwrap_or(Value::Null)
                } else {
                    Value::Object(merged)
                }
            }
        }
    }
}
