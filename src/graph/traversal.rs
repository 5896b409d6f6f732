//! Execution-order calculation.
//!
//! Kahn's algorithm with a triggers-first frontier: the in-degree-zero
//! nodes seed the queue with trigger nodes ahead of the rest, so an acyclic
//! workflow always starts at a trigger when it has one. Siblings with no
//! path between them keep their definition order, but callers must not rely
//! on any ordering beyond "source before target".

use std::collections::{HashMap, VecDeque};

use crate::error::{WorkflowError, WorkflowResult};
use crate::model::{NodeKind, Workflow};

/// Compute a dependency-honoring linear order of node ids.
///
/// Connections whose endpoints do not resolve are ignored here; the
/// validator reports those separately. A directed cycle fails with
/// [`WorkflowError::CycleDetected`] before any order is produced.
pub fn execution_order(workflow: &Workflow) -> WorkflowResult<Vec<String>> {
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut out_edges: HashMap<&str, Vec<&str>> = HashMap::new();

    for node in &workflow.nodes {
        in_degree.entry(node.id.as_str()).or_insert(0);
        out_edges.entry(node.id.as_str()).or_default();
    }

    for conn in &workflow.connections {
        let (source, target) = (conn.source.as_str(), conn.target.as_str());
        if !in_degree.contains_key(source) || !in_degree.contains_key(target) {
            continue;
        }
        out_edges.entry(source).or_default().push(target);
        *in_degree.entry(target).or_insert(0) += 1;
    }

    let mut frontier: VecDeque<&str> = VecDeque::new();
    for node in &workflow.nodes {
        if node.kind == NodeKind::Trigger && in_degree[node.id.as_str()] == 0 {
            frontier.push_back(node.id.as_str());
        }
    }
    for node in &workflow.nodes {
        if node.kind != NodeKind::Trigger && in_degree[node.id.as_str()] == 0 {
            frontier.push_back(node.id.as_str());
        }
    }

    let mut order = Vec::with_capacity(workflow.nodes.len());
    while let Some(node_id) = frontier.pop_front() {
        order.push(node_id.to_string());
        if let Some(successors) = out_edges.get(node_id) {
            for succ in successors {
                let degree = in_degree
                    .get_mut(succ)
                    .ok_or_else(|| WorkflowError::InternalError(format!("missing node {succ}")))?;
                *degree -= 1;
                if *degree == 0 {
                    frontier.push_back(succ);
                }
            }
        }
    }

    if order.len() != workflow.nodes.len() {
        return Err(WorkflowError::CycleDetected);
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Connection, Node, NodeKind};

    fn wf(nodes: &[(&str, NodeKind)], edges: &[(&str, &str)]) -> Workflow {
        let mut wf = Workflow::new("test");
        for (id, kind) in nodes {
            wf.nodes.push(Node::new(*id, *kind));
        }
        for (i, (s, t)) in edges.iter().enumerate() {
            wf.connections.push(Connection::new(format!("c{i}"), *s, *t));
        }
        wf
    }

    #[test]
    fn test_linear_order() {
        let wf = wf(
            &[
                ("trigger1", NodeKind::Trigger),
                ("equipment1", NodeKind::Equipment),
                ("imaging1", NodeKind::Imaging),
            ],
            &[("trigger1", "equipment1"), ("equipment1", "imaging1")],
        );
        let order = execution_order(&wf).unwrap();
        assert_eq!(order, vec!["trigger1", "equipment1", "imaging1"]);
    }

    #[test]
    fn test_order_respects_every_connection() {
        let wf = wf(
            &[
                ("script1", NodeKind::Script),
                ("trigger1", NodeKind::Trigger),
                ("script2", NodeKind::Script),
                ("notify1", NodeKind::Notification),
            ],
            &[
                ("trigger1", "script1"),
                ("trigger1", "script2"),
                ("script1", "notify1"),
                ("script2", "notify1"),
            ],
        );
        let order = execution_order(&wf).unwrap();
        let pos = |id: &str| order.iter().position(|n| n == id).unwrap();
        for conn in &wf.connections {
            assert!(pos(&conn.source) < pos(&conn.target));
        }
        assert_eq!(order[0], "trigger1");
    }

    #[test]
    fn test_trigger_first_even_when_defined_last() {
        let wf = wf(
            &[
                ("notify1", NodeKind::Notification),
                ("trigger1", NodeKind::Trigger),
            ],
            &[],
        );
        let order = execution_order(&wf).unwrap();
        assert_eq!(order[0], "trigger1");
    }

    #[test]
    fn test_cycle_is_rejected() {
        let wf = wf(
            &[
                ("trigger1", NodeKind::Trigger),
                ("script1", NodeKind::Script),
                ("script2", NodeKind::Script),
            ],
            &[
                ("trigger1", "script1"),
                ("script1", "script2"),
                ("script2", "script1"),
            ],
        );
        let err = execution_order(&wf).unwrap_err();
        assert_eq!(err.to_string(), "Circular dependency detected");
    }
}
