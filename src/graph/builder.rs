use std::collections::HashMap;

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Direction;

use crate::error::WorkflowError;
use crate::model::{Node, Workflow};

/// Edge classification derived from the connection's `sourceHandle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeKind {
    Normal,
    /// Condition node's true branch.
    TrueBranch,
    /// Condition node's false branch.
    FalseBranch,
}

impl EdgeKind {
    pub fn from_source_handle(handle: &Option<String>) -> Self {
        match handle.as_deref() {
            Some("true") => EdgeKind::TrueBranch,
            Some("false") => EdgeKind::FalseBranch,
            _ => EdgeKind::Normal,
        }
    }
}

/// Directed edge as stored in the graph.
#[derive(Debug, Clone)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    pub source_handle: Option<String>,
}

/// Node id to petgraph index mapping.
pub type NodeIndexMap = HashMap<String, NodeIndex>;

/// Immutable graph view over a workflow definition, used by the scheduler
/// and dispatcher for adjacency queries.
#[derive(Debug)]
pub struct WorkflowGraph {
    pub graph: StableDiGraph<Node, GraphEdge>,
    pub node_index: NodeIndexMap,
}

/// Build the petgraph representation. A connection referencing a missing
/// node is a build error here; `validate_workflow` reports the same
/// situation as a collected error string instead.
pub fn build_graph(workflow: &Workflow) -> Result<WorkflowGraph, WorkflowError> {
    let mut graph = StableDiGraph::new();
    let mut node_index = NodeIndexMap::new();

    for node in &workflow.nodes {
        let idx = graph.add_node(node.clone());
        node_index.insert(node.id.clone(), idx);
    }

    for conn in &workflow.connections {
        let source = node_index.get(&conn.source).ok_or_else(|| {
            WorkflowError::GraphBuildError(format!(
                "Connection {} references missing node {}",
                conn.id, conn.source
            ))
        })?;
        let target = node_index.get(&conn.target).ok_or_else(|| {
            WorkflowError::GraphBuildError(format!(
                "Connection {} references missing node {}",
                conn.id, conn.target
            ))
        })?;
        graph.add_edge(
            *source,
            *target,
            GraphEdge {
                id: conn.id.clone(),
                source: conn.source.clone(),
                target: conn.target.clone(),
                kind: EdgeKind::from_source_handle(&conn.source_handle),
                source_handle: conn.source_handle.clone(),
            },
        );
    }

    Ok(WorkflowGraph { graph, node_index })
}

impl WorkflowGraph {
    pub fn node(&self, node_id: &str) -> Result<&Node, WorkflowError> {
        let idx = self
            .node_index
            .get(node_id)
            .ok_or_else(|| WorkflowError::NodeNotFound(node_id.to_string()))?;
        self.graph
            .node_weight(*idx)
            .ok_or_else(|| WorkflowError::NodeNotFound(node_id.to_string()))
    }

    /// Outgoing edges of a node, in insertion order.
    pub fn outgoing(&self, node_id: &str) -> Vec<&GraphEdge> {
        let Some(idx) = self.node_index.get(node_id) else {
            return Vec::new();
        };
        let mut edges: Vec<&GraphEdge> = self
            .graph
            .edges_directed(*idx, Direction::Outgoing)
            .map(|e| e.weight())
            .collect();
        // petgraph iterates edges in reverse insertion order
        edges.reverse();
        edges
    }

    pub fn predecessors(&self, node_id: &str) -> Vec<String> {
        let Some(idx) = self.node_index.get(node_id) else {
            return Vec::new();
        };
        self.graph
            .neighbors_directed(*idx, Direction::Incoming)
            .filter_map(|n| self.graph.node_weight(n).map(|node| node.id.clone()))
            .collect()
    }

    pub fn successors(&self, node_id: &str) -> Vec<String> {
        let Some(idx) = self.node_index.get(node_id) else {
            return Vec::new();
        };
        self.graph
            .neighbors_directed(*idx, Direction::Outgoing)
            .filter_map(|n| self.graph.node_weight(n).map(|node| node.id.clone()))
            .collect()
    }

    pub fn in_degree(&self, node_id: &str) -> usize {
        self.node_index
            .get(node_id)
            .map(|idx| {
                self.graph
                    .edges_directed(*idx, Direction::Incoming)
                    .count()
            })
            .unwrap_or(0)
    }
}
