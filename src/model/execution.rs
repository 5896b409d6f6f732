use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Terminal and in-flight states of one run. The four terminal states are
/// mutually exclusive and final.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
    Aborted,
    #[serde(rename = "timeout")]
    TimedOut,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExecutionStatus::Running)
    }
}

/// Outcome of a single node within a run.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Completed,
    Failed,
}

/// Per-node outcome record. Nodes pruned by conditional branching get no
/// record at all.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub node_id: String,
    pub status: StepStatus,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    /// Total executor invocations, retries included.
    pub attempts: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// The record of one run. Created at run start, mutated only by the
/// dispatcher for the run's duration, immutable once terminal.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub id: String,
    pub workflow_id: String,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    pub steps: Vec<StepRecord>,
    /// Snapshot of the workflow variables the run was resolved against.
    pub variables: HashMap<String, Value>,
    /// Top-level failure description, if any.
    #[serde(default)]
    pub error: Option<String>,
}

impl Execution {
    /// Latest per-node status, projected from step records. This is what UI
    /// highlighting reads instead of mutating node entities.
    pub fn node_status(&self, node_id: &str) -> Option<StepStatus> {
        self.steps
            .iter()
            .rev()
            .find(|s| s.node_id == node_id)
            .map(|s| s.status)
    }

    pub fn step(&self, node_id: &str) -> Option<&StepRecord> {
        self.steps.iter().find(|s| s.node_id == node_id)
    }
}
