//! Trigger, condition, and delay executors.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::{sleep, Duration};

use crate::core::context::ExecutionContext;
use crate::error::NodeError;
use crate::evaluator;
use crate::model::Node;

use super::executor::NodeExecutor;

fn parse_config<T: serde::de::DeserializeOwned>(node: &Node) -> Result<T, NodeError> {
    serde_json::from_value(Value::Object(node.config.clone()))
        .map_err(|e| NodeError::ConfigError(format!("node {}: {e}", node.id)))
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct TriggerConfig {
    #[serde(default)]
    trigger_type: Option<String>,
}

/// Entry point of a run; succeeds unconditionally and signals that the
/// workflow should proceed.
pub struct TriggerExecutor;

#[async_trait]
impl NodeExecutor for TriggerExecutor {
    async fn execute(
        &self,
        node: &Node,
        _input: &Value,
        _context: &ExecutionContext,
    ) -> Result<Value, NodeError> {
        let config: TriggerConfig = parse_config(node)?;
        Ok(json!({
            "triggered": true,
            "triggerType": config.trigger_type.unwrap_or_else(|| "manual".to_string()),
        }))
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ConditionConfig {
    condition: String,
}

/// Evaluates the configured expression against the execution context; the
/// dispatcher routes downstream along the matching `true`/`false` branch.
pub struct ConditionExecutor;

#[async_trait]
impl NodeExecutor for ConditionExecutor {
    async fn execute(
        &self,
        node: &Node,
        input: &Value,
        context: &ExecutionContext,
    ) -> Result<Value, NodeError> {
        let config: ConditionConfig = parse_config(node)?;
        let result = evaluator::evaluate(&config.condition, context, input)?;
        tracing::debug!(node_id = %node.id, condition = %config.condition, result, "condition evaluated");
        Ok(json!({
            "conditionResult": result,
            "condition": config.condition,
        }))
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct DelayConfig {
    /// Milliseconds.
    duration: u64,
}

/// Waits for the configured duration. Subject to the run-wide timeout: a
/// delay longer than the budget ends the run as timed out, it does not
/// block it.
pub struct DelayExecutor;

#[async_trait]
impl NodeExecutor for DelayExecutor {
    async fn execute(
        &self,
        node: &Node,
        _input: &Value,
        _context: &ExecutionContext,
    ) -> Result<Value, NodeError> {
        let config: DelayConfig = parse_config(node)?;
        sleep(Duration::from_millis(config.duration)).await;
        Ok(json!({ "delayed": config.duration }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeKind;

    #[tokio::test]
    async fn test_trigger_always_succeeds() {
        let node = Node::new("trigger1", NodeKind::Trigger);
        let out = TriggerExecutor
            .execute(&node, &Value::Null, &ExecutionContext::new())
            .await
            .unwrap();
        assert_eq!(out["triggered"], json!(true));
        assert_eq!(out["triggerType"], json!("manual"));
    }

    #[tokio::test]
    async fn test_condition_reads_context() {
        let node = Node::new("condition1", NodeKind::Condition)
            .with_config("condition", json!("weather.cloudCover < 30"));
        let ctx = ExecutionContext::new();
        ctx.set("weather.cloudCover", json!(20));
        let out = ConditionExecutor
            .execute(&node, &Value::Null, &ctx)
            .await
            .unwrap();
        assert_eq!(out["conditionResult"], json!(true));
    }

    #[tokio::test]
    async fn test_condition_missing_config_is_error() {
        let node = Node::new("condition1", NodeKind::Condition);
        let err = ConditionExecutor
            .execute(&node, &Value::Null, &ExecutionContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_delay_sleeps_roughly_configured_time() {
        let node = Node::new("delay1", NodeKind::Delay).with_config("duration", json!(30));
        let start = std::time::Instant::now();
        DelayExecutor
            .execute(&node, &Value::Null, &ExecutionContext::new())
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
