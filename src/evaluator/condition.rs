//! Condition expression evaluation.
//!
//! Expressions have the form `operand OP operand`, e.g.
//! `weather.cloudCover < 30`. Operands are number/bool/quoted-string
//! literals or dotted context paths; context paths that do not resolve make
//! the condition evaluate to false rather than failing the node.

use serde_json::Value;

use crate::core::context::ExecutionContext;
use crate::error::NodeError;

use super::operators;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    LessOrEqual,
    GreaterOrEqual,
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
}

// Two-character operators first so "<=" is not split as "<" + "=".
const OPERATORS: &[(&str, Comparison)] = &[
    ("<=", Comparison::LessOrEqual),
    (">=", Comparison::GreaterOrEqual),
    ("==", Comparison::Equal),
    ("!=", Comparison::NotEqual),
    ("<", Comparison::LessThan),
    (">", Comparison::GreaterThan),
];

/// Evaluate a condition expression against the execution context and the
/// node's inbound payload (addressable as `input.<path>`).
pub fn evaluate(
    expression: &str,
    context: &ExecutionContext,
    input: &Value,
) -> Result<bool, NodeError> {
    let expression = expression.trim();
    let (lhs, comparison, rhs) = split_expression(expression).ok_or_else(|| {
        NodeError::ConditionError(format!("unsupported expression: '{expression}'"))
    })?;

    let left = resolve_operand(lhs, context, input);
    let right = resolve_operand(rhs, context, input);
    let (left, right) = match (left, right) {
        (Some(l), Some(r)) => (l, r),
        // Unresolvable operand: the condition is simply not met.
        _ => return Ok(false),
    };

    Ok(match comparison {
        Comparison::Equal => operators::equal(&left, &right),
        Comparison::NotEqual => !operators::equal(&left, &right),
        Comparison::LessThan => operators::less_than(&left, &right),
        Comparison::GreaterThan => operators::greater_than(&left, &right),
        Comparison::LessOrEqual => !operators::greater_than(&left, &right)
            && (operators::as_f64(&left).is_some() && operators::as_f64(&right).is_some()),
        Comparison::GreaterOrEqual => !operators::less_than(&left, &right)
            && (operators::as_f64(&left).is_some() && operators::as_f64(&right).is_some()),
    })
}

fn split_expression(expression: &str) -> Option<(&str, Comparison, &str)> {
    for (token, comparison) in OPERATORS {
        if let Some(pos) = expression.find(token) {
            let lhs = expression[..pos].trim();
            let rhs = expression[pos + token.len()..].trim();
            if lhs.is_empty() || rhs.is_empty() {
                return None;
            }
            return Some((lhs, *comparison, rhs));
        }
    }
    None
}

/// Literal first (number, bool, null, quoted string), then `input.<path>`,
/// then a context path.
fn resolve_operand(operand: &str, context: &ExecutionContext, input: &Value) -> Option<Value> {
    if let Ok(n) = operand.parse::<f64>() {
        return serde_json::Number::from_f64(n).map(Value::Number);
    }
    match operand {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        "null" => return Some(Value::Null),
        _ => {}
    }
    if (operand.starts_with('\'') && operand.ends_with('\'') && operand.len() >= 2)
        || (operand.starts_with('"') && operand.ends_with('"') && operand.len() >= 2)
    {
        return Some(Value::String(operand[1..operand.len() - 1].to_string()));
    }
    if operand == "input" {
        return Some(input.clone());
    }
    if let Some(path) = operand.strip_prefix("input.") {
        return lookup_in_value(input, path);
    }
    context.get(operand)
}

fn lookup_in_value(value: &Value, path: &str) -> Option<Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current.clone())
}
