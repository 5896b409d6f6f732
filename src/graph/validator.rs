//! Structural and semantic workflow validation.
//!
//! All findings are collected into a [`ValidationReport`] rather than
//! thrown; the builder UI renders `errors` inline and blocks execution
//! while any are present. Warnings never affect validity.

use std::collections::HashSet;

use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};

use crate::model::{NodeKind, Workflow};

/// Aggregated result of workflow validation.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Validate a workflow definition. Checks, in order: trigger presence,
/// connection referential integrity, orphan nodes (warning only), per-kind
/// required config keys, and cycle detection over resolvable connections.
pub fn validate_workflow(workflow: &Workflow) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if !workflow.nodes.iter().any(|n| n.kind == NodeKind::Trigger) {
        errors.push("Workflow must have at least one trigger node".to_string());
    }

    let node_ids: HashSet<&str> = workflow.nodes.iter().map(|n| n.id.as_str()).collect();
    for conn in &workflow.connections {
        if !node_ids.contains(conn.source.as_str()) {
            errors.push(format!(
                "Connection {} references missing node {}",
                conn.id, conn.source
            ));
        }
        if !node_ids.contains(conn.target.as_str()) {
            errors.push(format!(
                "Connection {} references missing node {}",
                conn.id, conn.target
            ));
        }
    }

    let mut connected: HashSet<&str> = HashSet::new();
    for conn in &workflow.connections {
        connected.insert(conn.source.as_str());
        connected.insert(conn.target.as_str());
    }
    for node in &workflow.nodes {
        // An isolated trigger is a legitimate entry point; everything else
        // unconnected is suspicious but not fatal.
        if node.kind == NodeKind::Trigger {
            continue;
        }
        if !connected.contains(node.id.as_str()) {
            warnings.push(format!(
                "Node {} is not connected to any other nodes",
                node.id
            ));
        }
    }

    for node in &workflow.nodes {
        for field in node.kind.required_fields() {
            if !node.config.contains_key(*field) {
                errors.push(format!(
                    "Node {} is missing required field '{}'",
                    node.id, field
                ));
            }
        }
    }

    if has_cycle(workflow) {
        errors.push("Workflow contains a circular dependency".to_string());
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Cycle check over connections whose endpoints both resolve, so a dangling
/// connection stays an integrity error instead of a crash here.
fn has_cycle(workflow: &Workflow) -> bool {
    let mut graph: StableDiGraph<(), ()> = StableDiGraph::new();
    let mut index = std::collections::HashMap::new();
    for node in &workflow.nodes {
        index.insert(node.id.as_str(), graph.add_node(()));
    }
    for conn in &workflow.connections {
        if let (Some(s), Some(t)) = (
            index.get(conn.source.as_str()),
            index.get(conn.target.as_str()),
        ) {
            graph.add_edge(*s, *t, ());
        }
    }
    petgraph::algo::is_cyclic_directed(&graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Connection, Node, NodeKind};
    use serde_json::json;

    fn trigger(id: &str) -> Node {
        Node::new(id, NodeKind::Trigger)
    }

    #[test]
    fn test_missing_trigger() {
        let mut wf = Workflow::new("no trigger");
        wf.nodes.push(Node::new("imaging1", NodeKind::Imaging));
        let report = validate_workflow(&wf);
        assert!(!report.is_valid);
        assert!(report
            .errors
            .contains(&"Workflow must have at least one trigger node".to_string()));
    }

    #[test]
    fn test_dangling_connection() {
        let mut wf = Workflow::new("dangling");
        wf.nodes.push(trigger("trigger1"));
        wf.connections.push(Connection::new("c1", "trigger1", "ghost"));
        let report = validate_workflow(&wf);
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("ghost")));
    }

    #[test]
    fn test_orphan_is_warning_not_error() {
        let mut wf = Workflow::new("orphan");
        wf.nodes.push(trigger("trigger1"));
        wf.nodes.push(
            Node::new("script1", NodeKind::Script).with_config("script", json!("context.x = 1")),
        );
        wf.nodes.push(
            Node::new("notify1", NodeKind::Notification)
                .with_config("message", json!("done")),
        );
        wf.connections
            .push(Connection::new("c1", "trigger1", "script1"));
        let report = validate_workflow(&wf);
        assert!(report.is_valid);
        assert!(report
            .warnings
            .contains(&"Node notify1 is not connected to any other nodes".to_string()));
    }

    #[test]
    fn test_single_trigger_workflow_has_no_orphan_warning() {
        let mut wf = Workflow::new("just a trigger");
        wf.nodes.push(trigger("trigger1"));
        let report = validate_workflow(&wf);
        assert!(report.is_valid);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_missing_required_field() {
        let mut wf = Workflow::new("missing field");
        wf.nodes.push(trigger("trigger1"));
        wf.nodes.push(
            Node::new("equipment1", NodeKind::Equipment).with_config("equipmentId", json!("mount")),
        );
        wf.connections
            .push(Connection::new("c1", "trigger1", "equipment1"));
        let report = validate_workflow(&wf);
        assert!(!report.is_valid);
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("equipment1") && e.contains("action")));
    }

    #[test]
    fn test_cycle_reported_as_circular() {
        let mut wf = Workflow::new("cyclic");
        wf.nodes.push(trigger("trigger1"));
        wf.nodes.push(
            Node::new("script1", NodeKind::Script).with_config("script", json!("context.x = 1")),
        );
        wf.nodes.push(
            Node::new("script2", NodeKind::Script).with_config("script", json!("context.y = 2")),
        );
        wf.connections
            .push(Connection::new("c1", "trigger1", "script1"));
        wf.connections
            .push(Connection::new("c2", "script1", "script2"));
        wf.connections
            .push(Connection::new("c3", "script2", "script1"));
        let report = validate_workflow(&wf);
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("circular")));
    }
}
