//! Script node: a small statement interpreter with read/write access to
//! the execution context and read access to the inbound payload.
//!
//! One statement per line (or `;`-separated):
//!
//! ```text
//! context.sequence.current = 3
//! context.lastOutput = input.framesCaptured
//! context.cloud = weather summary   // not valid: expressions are literals or paths
//! ```
//!
//! Supported expressions are JSON literals (single-quoted strings also
//! accepted), `context.<path>`, `input`, and `input.<path>`. The value of
//! the last expression statement becomes the node's `result` output.
//! Context mutations are visible to later nodes of the same run only.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::context::ExecutionContext;
use crate::error::NodeError;
use crate::model::Node;

use super::executor::NodeExecutor;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ScriptConfig {
    script: String,
}

pub struct ScriptExecutor;

#[async_trait]
impl NodeExecutor for ScriptExecutor {
    async fn execute(
        &self,
        node: &Node,
        input: &Value,
        context: &ExecutionContext,
    ) -> Result<Value, NodeError> {
        let config: ScriptConfig =
            serde_json::from_value(Value::Object(node.config.clone()))
                .map_err(|e| NodeError::ConfigError(format!("node {}: {e}", node.id)))?;
        let result = run_script(&config.script, input, context)?;
        Ok(json!({ "result": result }))
    }
}

fn run_script(
    script: &str,
    input: &Value,
    context: &ExecutionContext,
) -> Result<Value, NodeError> {
    let mut last = Value::Null;
    for statement in script.split(['\n', ';']) {
        let statement = statement.trim();
        if statement.is_empty() || statement.starts_with("//") {
            continue;
        }
        match parse_assignment(statement) {
            Some((path, expr)) => {
                let value = eval_expr(expr, input, context)?;
                context.set(path, value);
            }
            None => {
                last = eval_expr(statement, input, context)?;
            }
        }
    }
    Ok(last)
}

/// `context.<path> = <expr>`, rejecting comparison operators so that
/// `context.x == 1` is an expression, not an assignment.
fn parse_assignment(statement: &str) -> Option<(&str, &str)> {
    let rest = statement.strip_prefix("context.")?;
    let eq = rest.find('=')?;
    let (path, tail) = rest.split_at(eq);
    let expr = tail.strip_prefix('=')?;
    if expr.starts_with('=') || path.trim_end().ends_with(['!', '<', '>']) {
        return None;
    }
    Some((path.trim(), expr.trim()))
}

fn eval_expr(expr: &str, input: &Value, context: &ExecutionContext) -> Result<Value, NodeError> {
    if expr == "input" {
        return Ok(input.clone());
    }
    if let Some(path) = expr.strip_prefix("input.") {
        return Ok(lookup_in_value(input, path).unwrap_or(Value::Null));
    }
    if let Some(path) = expr.strip_prefix("context.") {
        return Ok(context.get(path).unwrap_or(Value::Null));
    }
    if let Ok(value) = serde_json::from_str::<Value>(expr) {
        return Ok(value);
    }
    if expr.starts_with('\'') && expr.ends_with('\'') && expr.len() >= 2 {
        return Ok(Value::String(expr[1..expr.len() - 1].to_string()));
    }
    Err(NodeError::ScriptError(format!(
        "cannot evaluate expression: '{expr}'"
    )))
}

fn lookup_in_value(value: &Value, path: &str) -> Option<Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeKind;

    fn script_node(script: &str) -> Node {
        Node::new("script1", NodeKind::Script).with_config("script", json!(script))
    }

    #[tokio::test]
    async fn test_assignment_mutates_context() {
        let ctx = ExecutionContext::new();
        ScriptExecutor
            .execute(
                &script_node("context.testValue = 42"),
                &Value::Null,
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(ctx.get("testValue"), Some(json!(42)));
    }

    #[tokio::test]
    async fn test_reads_inbound_payload() {
        let ctx = ExecutionContext::new();
        let input = json!({ "framesCaptured": 12 });
        let out = ScriptExecutor
            .execute(
                &script_node("context.frames = input.framesCaptured; context.frames"),
                &input,
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(ctx.get("frames"), Some(json!(12)));
        assert_eq!(out["result"], json!(12));
    }

    #[tokio::test]
    async fn test_multi_statement_and_comments() {
        let ctx = ExecutionContext::new();
        let script = "// set up the sequence\ncontext.sequence.current = 1\ncontext.sequence.total = 5\ncontext.sequence";
        let out = ScriptExecutor
            .execute(&script_node(script), &Value::Null, &ctx)
            .await
            .unwrap();
        assert_eq!(out["result"], json!({ "current": 1, "total": 5 }));
    }

    #[tokio::test]
    async fn test_unknown_token_is_script_error() {
        let ctx = ExecutionContext::new();
        let err = ScriptExecutor
            .execute(&script_node("launch the rocket"), &Value::Null, &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::ScriptError(_)));
    }

    #[test]
    fn test_parse_assignment_rejects_comparison() {
        assert!(parse_assignment("context.x == 1").is_none());
        assert!(parse_assignment("context.x != 1").is_none());
        assert_eq!(
            parse_assignment("context.x = 1"),
            Some(("x", "1"))
        );
    }
}
