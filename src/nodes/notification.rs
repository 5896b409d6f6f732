//! Notification executor. Delivery is mocked; the payload mirrors what the
//! mobile app's notification panel renders.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::context::ExecutionContext;
use crate::error::NodeError;
use crate::model::Node;

use super::executor::NodeExecutor;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct NotificationConfig {
    message: String,
    #[serde(default = "default_channel")]
    channel: String,
}

fn default_channel() -> String {
    "in-app".to_string()
}

pub struct NotificationExecutor;

#[async_trait]
impl NodeExecutor for NotificationExecutor {
    async fn execute(
        &self,
        node: &Node,
        _input: &Value,
        _context: &ExecutionContext,
    ) -> Result<Value, NodeError> {
        let config: NotificationConfig =
            serde_json::from_value(Value::Object(node.config.clone()))
                .map_err(|e| NodeError::ConfigError(format!("node {}: {e}", node.id)))?;
        tracing::debug!(node_id = %node.id, channel = %config.channel, "notification delivered");
        Ok(json!({
            "delivered": true,
            "message": config.message,
            "channel": config.channel,
            "deliveredAt": Utc::now(),
        }))
    }
}
