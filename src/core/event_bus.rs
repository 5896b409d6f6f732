//! Lifecycle event bus.
//!
//! An explicit observer registry keyed by event kind. `on` hands back a
//! [`ListenerId`]; `off` removes by that id, so removal is identity-based
//! and a removed handler can never fire again, including for runs started
//! later. Listener panics are caught and logged so one bad handler cannot
//! abort a run or starve the other listeners.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;

/// Event kinds, named the way the builder UI subscribes to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    WorkflowStarted,
    NodeExecuted,
    NodeFailed,
    WorkflowCompleted,
    WorkflowFailed,
    WorkflowAborted,
    BranchSelected,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::WorkflowStarted => "workflow.started",
            EventKind::NodeExecuted => "node.executed",
            EventKind::NodeFailed => "node.failed",
            EventKind::WorkflowCompleted => "workflow.completed",
            EventKind::WorkflowFailed => "workflow.failed",
            EventKind::WorkflowAborted => "workflow.aborted",
            EventKind::BranchSelected => "branch.selected",
        }
    }
}

/// Event payloads delivered to listeners.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase", tag = "event")]
pub enum WorkflowEvent {
    WorkflowStarted {
        execution_id: String,
        workflow_id: String,
        timestamp: DateTime<Utc>,
    },
    NodeExecuted {
        execution_id: String,
        node_id: String,
        success: bool,
        output: Option<Value>,
        timestamp: DateTime<Utc>,
    },
    NodeFailed {
        execution_id: String,
        node_id: String,
        error: String,
        timestamp: DateTime<Utc>,
    },
    WorkflowCompleted {
        execution_id: String,
        workflow_id: String,
        timestamp: DateTime<Utc>,
    },
    WorkflowFailed {
        execution_id: String,
        workflow_id: String,
        error: String,
        timestamp: DateTime<Utc>,
    },
    WorkflowAborted {
        execution_id: String,
        workflow_id: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    BranchSelected {
        execution_id: String,
        node_id: String,
        branch: String,
        timestamp: DateTime<Utc>,
    },
}

impl WorkflowEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WorkflowEvent::WorkflowStarted { .. } => EventKind::WorkflowStarted,
            WorkflowEvent::NodeExecuted { .. } => EventKind::NodeExecuted,
            WorkflowEvent::NodeFailed { .. } => EventKind::NodeFailed,
            WorkflowEvent::WorkflowCompleted { .. } => EventKind::WorkflowCompleted,
            WorkflowEvent::WorkflowFailed { .. } => EventKind::WorkflowFailed,
            WorkflowEvent::WorkflowAborted { .. } => EventKind::WorkflowAborted,
            WorkflowEvent::BranchSelected { .. } => EventKind::BranchSelected,
        }
    }
}

/// Subscriber handle returned by [`EventBus::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Handler = Arc<dyn Fn(&WorkflowEvent) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    by_kind: HashMap<EventKind, Vec<(ListenerId, Handler)>>,
}

/// Cheaply cloneable pub/sub registry shared between the engine facade and
/// per-run dispatchers.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<RwLock<Listeners>>,
    next_id: Arc<AtomicU64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind.
    pub fn on<F>(&self, kind: EventKind, handler: F) -> ListenerId
    where
        F: Fn(&WorkflowEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .by_kind
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Remove a previously registered handler. Returns whether it was
    /// still registered.
    pub fn off(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let Some(handlers) = listeners.by_kind.get_mut(&kind) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        handlers.len() != before
    }

    /// Deliver an event to every handler registered for its kind, in
    /// registration order. The listener list is snapshotted first so
    /// handlers may call `on`/`off` without deadlocking.
    pub fn emit(&self, event: WorkflowEvent) {
        let kind = event.kind();
        let handlers: Vec<Handler> = {
            let listeners = self.listeners.read();
            match listeners.by_kind.get(&kind) {
                Some(handlers) => handlers.iter().map(|(_, h)| h.clone()).collect(),
                None => return,
            }
        };
        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(&event))).is_err() {
                tracing::warn!(event = kind.as_str(), "event listener panicked");
            }
        }
    }
}
