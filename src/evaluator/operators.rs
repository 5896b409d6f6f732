//! JSON value comparison with the coercions condition expressions expect.

use serde_json::Value;

pub fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Equality with cross-type coercion: numbers compare numerically, numeric
/// strings compare against numbers, "true"/"false" against booleans.
pub fn equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => as_f64(a) == as_f64(b),
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
            if let Ok(parsed) = s.parse::<f64>() {
                Some(parsed) == n.as_f64()
            } else {
                false
            }
        }
        (Value::Bool(flag), Value::String(s)) | (Value::String(s), Value::Bool(flag)) => {
            match s.to_lowercase().as_str() {
                "true" => *flag,
                "false" => !*flag,
                _ => false,
            }
        }
        _ => false,
    }
}

pub fn less_than(a: &Value, b: &Value) -> bool {
    match (as_f64(a), as_f64(b)) {
        (Some(a), Some(b)) => a < b,
        _ => false,
    }
}

pub fn greater_than(a: &Value, b: &Value) -> bool {
    match (as_f64(a), as_f64(b)) {
        (Some(a), Some(b)) => a > b,
        _ => false,
    }
}
