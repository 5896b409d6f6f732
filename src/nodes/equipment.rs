//! Equipment and imaging executors over the mock hardware catalog.
//!
//! Real device protocols are out of scope; the catalog stands in for the
//! connected-equipment registry the mobile app simulates. Referencing
//! unknown equipment or an unsupported action is the deliberately
//! triggerable failure path used by retry and error-handling tests.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::context::ExecutionContext;
use crate::error::NodeError;
use crate::model::Node;

use super::executor::NodeExecutor;

/// Equipment id to the actions it accepts.
const EQUIPMENT_CATALOG: &[(&str, &[&str])] = &[
    ("camera", &["capture", "abort", "cool", "warm", "set-gain"]),
    ("mount", &["slew", "track", "park", "unpark", "home"]),
    ("filter-wheel", &["change-filter", "calibrate"]),
    ("focuser", &["move", "auto-focus", "halt"]),
];

fn catalog_actions(equipment_id: &str) -> Option<&'static [&'static str]> {
    EQUIPMENT_CATALOG
        .iter()
        .find(|(id, _)| *id == equipment_id)
        .map(|(_, actions)| *actions)
}

fn parse_config<T: serde::de::DeserializeOwned>(node: &Node) -> Result<T, NodeError> {
    serde_json::from_value(Value::Object(node.config.clone()))
        .map_err(|e| NodeError::ConfigError(format!("node {}: {e}", node.id)))
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct EquipmentConfig {
    equipment_id: String,
    action: String,
    #[serde(default)]
    parameters: Option<Value>,
}

/// Dispatches an action to a catalog device.
pub struct EquipmentExecutor;

#[async_trait]
impl NodeExecutor for EquipmentExecutor {
    async fn execute(
        &self,
        node: &Node,
        _input: &Value,
        _context: &ExecutionContext,
    ) -> Result<Value, NodeError> {
        let config: EquipmentConfig = parse_config(node)?;
        let actions = catalog_actions(&config.equipment_id)
            .ok_or_else(|| NodeError::UnknownEquipment(config.equipment_id.clone()))?;
        if !actions.contains(&config.action.as_str()) {
            return Err(NodeError::UnknownAction {
                equipment_id: config.equipment_id,
                action: config.action,
            });
        }
        tracing::debug!(node_id = %node.id, equipment = %config.equipment_id, action = %config.action, "equipment action dispatched");
        Ok(json!({
            "equipmentId": config.equipment_id,
            "action": config.action,
            "parameters": config.parameters,
            "completedAt": Utc::now(),
        }))
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ImagingConfig {
    /// Seconds per frame.
    exposure_time: f64,
    frame_count: u32,
    #[serde(default)]
    filter: Option<String>,
    #[serde(default)]
    binning: Option<String>,
    #[serde(default)]
    gain: Option<u32>,
}

/// Simulated capture sequence; echoes the configured plan as its summary.
pub struct ImagingExecutor;

#[async_trait]
impl NodeExecutor for ImagingExecutor {
    async fn execute(
        &self,
        node: &Node,
        _input: &Value,
        _context: &ExecutionContext,
    ) -> Result<Value, NodeError> {
        let config: ImagingConfig = parse_config(node)?;
        Ok(json!({
            "exposureTime": config.exposure_time,
            "frameCount": config.frame_count,
            "framesCaptured": config.frame_count,
            "totalIntegration": config.exposure_time * f64::from(config.frame_count),
            "filter": config.filter,
            "binning": config.binning,
            "gain": config.gain,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeKind;

    #[tokio::test]
    async fn test_equipment_known_action() {
        let node = Node::new("equipment1", NodeKind::Equipment)
            .with_config("equipmentId", json!("mount"))
            .with_config("action", json!("slew"));
        let out = EquipmentExecutor
            .execute(&node, &Value::Null, &ExecutionContext::new())
            .await
            .unwrap();
        assert_eq!(out["equipmentId"], json!("mount"));
        assert_eq!(out["action"], json!("slew"));
    }

    #[tokio::test]
    async fn test_unknown_equipment_fails() {
        let node = Node::new("equipment1", NodeKind::Equipment)
            .with_config("equipmentId", json!("nonexistent"))
            .with_config("action", json!("slew"));
        let err = EquipmentExecutor
            .execute(&node, &Value::Null, &ExecutionContext::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown equipment: nonexistent");
    }

    #[tokio::test]
    async fn test_unknown_action_fails() {
        let node = Node::new("equipment1", NodeKind::Equipment)
            .with_config("equipmentId", json!("camera"))
            .with_config("action", json!("slew"));
        let err = EquipmentExecutor
            .execute(&node, &Value::Null, &ExecutionContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::UnknownAction { .. }));
    }

    #[tokio::test]
    async fn test_imaging_echoes_plan() {
        let node = Node::new("imaging1", NodeKind::Imaging)
            .with_config("exposureTime", json!(300))
            .with_config("frameCount", json!(12))
            .with_config("filter", json!("Ha"));
        let out = ImagingExecutor
            .execute(&node, &Value::Null, &ExecutionContext::new())
            .await
            .unwrap();
        assert_eq!(out["exposureTime"], json!(300.0));
        assert_eq!(out["frameCount"], json!(12));
        assert_eq!(out["totalIntegration"], json!(3600.0));
        assert_eq!(out["filter"], json!("Ha"));
    }
}
