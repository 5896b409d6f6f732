use thiserror::Error;

/// Node-level errors. These never cross the dispatcher boundary as `Err`;
/// the dispatcher converts them into recorded step failures.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Unknown equipment: {0}")]
    UnknownEquipment(String),
    #[error("Unknown action '{action}' for equipment {equipment_id}")]
    UnknownAction {
        equipment_id: String,
        action: String,
    },
    #[error("Execution error: {0}")]
    ExecutionError(String),
    #[error("Script error: {0}")]
    ScriptError(String),
    #[error("Condition error: {0}")]
    ConditionError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for NodeError {
    fn from(e: serde_json::Error) -> Self {
        NodeError::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_node_type_message() {
        let err = NodeError::UnknownNodeType("loop".into());
        assert_eq!(err.to_string(), "Unknown node type: loop");
    }

    #[test]
    fn test_unknown_action_message() {
        let err = NodeError::UnknownAction {
            equipment_id: "mount".into(),
            action: "fly".into(),
        };
        assert_eq!(err.to_string(), "Unknown action 'fly' for equipment mount");
    }
}
