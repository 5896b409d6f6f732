use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::node::Node;

/// Directed edge between two node ports.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    #[serde(default)]
    pub id: String,
    pub source: String,
    pub target: String,
    /// Named source port, e.g. `"true"` / `"false"` on a condition node.
    #[serde(default)]
    pub source_handle: Option<String>,
    #[serde(default)]
    pub target_handle: Option<String>,
}

impl Connection {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Connection {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
        }
    }

    pub fn with_source_handle(mut self, handle: impl Into<String>) -> Self {
        self.source_handle = Some(handle.into());
        self
    }
}

/// What the coordinator does after a node exhausts its retries.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorHandling {
    /// Keep walking the remaining order; the failure is still recorded and
    /// the run finishes as failed.
    Continue,
    /// Stop the walk at the first unrecovered failure.
    Abort,
}

impl Default for ErrorHandling {
    fn default() -> Self {
        ErrorHandling::Abort
    }
}

/// Run-level settings, scoped to one workflow definition.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSettings {
    /// Wall-clock budget for one run, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Additional attempts after a failed one; total attempts = 1 + this.
    #[serde(default)]
    pub retry_attempts: u32,
    #[serde(default)]
    pub error_handling: ErrorHandling,
}

fn default_timeout() -> u64 {
    300
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        WorkflowSettings {
            timeout: default_timeout(),
            retry_attempts: 0,
            error_handling: ErrorHandling::default(),
        }
    }
}

/// The top-level aggregate: a node/connection graph plus definition-scoped
/// variables and run settings. Mutated only between runs.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    /// Variable name (possibly dotted) to value. Read-only during a run.
    #[serde(default)]
    pub variables: HashMap<String, Value>,
    #[serde(default)]
    pub settings: WorkflowSettings,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Self {
        Workflow {
            id: String::new(),
            name: name.into(),
            description: String::new(),
            nodes: Vec::new(),
            connections: Vec::new(),
            variables: HashMap::new(),
            settings: WorkflowSettings::default(),
            enabled: true,
        }
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_settings_defaults() {
        let settings: WorkflowSettings = serde_json::from_value(json!({})).unwrap();
        assert_eq!(settings.timeout, 300);
        assert_eq!(settings.retry_attempts, 0);
        assert_eq!(settings.error_handling, ErrorHandling::Abort);
    }

    #[test]
    fn test_workflow_deserialize() {
        let wf: Workflow = serde_json::from_value(json!({
            "id": "wf-1",
            "name": "Nightly mosaic",
            "nodes": [{ "id": "trigger1", "type": "trigger" }],
            "connections": [],
            "settings": { "timeout": 60, "retryAttempts": 2, "errorHandling": "continue" }
        }))
        .unwrap();
        assert!(wf.enabled);
        assert_eq!(wf.settings.retry_attempts, 2);
        assert_eq!(wf.settings.error_handling, ErrorHandling::Continue);
        assert!(wf.node("trigger1").is_some());
    }
}
