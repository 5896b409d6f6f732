use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Node kind tag. Closed set: adding a kind is a compile-time-checked
/// change in the executor dispatch, not a string registration.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Trigger,
    Equipment,
    Imaging,
    Condition,
    Action,
    Script,
    Delay,
    Loop,
    Notification,
    Processing,
}

impl NodeKind {
    /// The wire/display name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Trigger => "trigger",
            NodeKind::Equipment => "equipment",
            NodeKind::Imaging => "imaging",
            NodeKind::Condition => "condition",
            NodeKind::Action => "action",
            NodeKind::Script => "script",
            NodeKind::Delay => "delay",
            NodeKind::Loop => "loop",
            NodeKind::Notification => "notification",
            NodeKind::Processing => "processing",
        }
    }

    /// Config keys that must be present for a node of this kind to be
    /// executable. Checked by the validator, not at deserialization time,
    /// so a half-built workflow can still be loaded and inspected.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            NodeKind::Trigger => &[],
            NodeKind::Equipment => &["equipmentId", "action"],
            NodeKind::Imaging => &["exposureTime", "frameCount"],
            NodeKind::Condition => &["condition"],
            NodeKind::Action => &[],
            NodeKind::Script => &["script"],
            NodeKind::Delay => &["duration"],
            NodeKind::Loop => &[],
            NodeKind::Notification => &["message"],
            NodeKind::Processing => &[],
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single operation unit in a workflow graph.
///
/// `config` is a raw JSON map; each executor parses its own typed config
/// struct out of it. There is no run-state field here: per-node status is a
/// projection over the current [`Execution`](super::Execution)'s step
/// records, so stale state can never leak across runs.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub label: String,
    /// Display coordinates. Irrelevant to execution semantics.
    #[serde(default)]
    pub position: (f64, f64),
    #[serde(default)]
    pub config: Map<String, Value>,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Node {
            id: id.into(),
            kind,
            label: String::new(),
            position: (0.0, 0.0),
            config: Map::new(),
        }
    }

    /// Builder-style config entry, handy in tests and demo wiring.
    pub fn with_config(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_roundtrip() {
        let kind: NodeKind = serde_json::from_value(json!("equipment")).unwrap();
        assert_eq!(kind, NodeKind::Equipment);
        assert_eq!(serde_json::to_value(kind).unwrap(), json!("equipment"));
    }

    #[test]
    fn test_required_fields() {
        assert_eq!(
            NodeKind::Equipment.required_fields(),
            &["equipmentId", "action"]
        );
        assert!(NodeKind::Trigger.required_fields().is_empty());
    }

    #[test]
    fn test_node_deserialize_camel_case() {
        let node: Node = serde_json::from_value(json!({
            "id": "imaging1",
            "type": "imaging",
            "label": "Luminance run",
            "position": [120.0, 40.0],
            "config": { "exposureTime": 300, "frameCount": 12 }
        }))
        .unwrap();
        assert_eq!(node.kind, NodeKind::Imaging);
        assert_eq!(node.config["frameCount"], json!(12));
    }
}
