//! Per-run execution context.
//!
//! A dotted-path key/value store owned by exactly one run. Script and
//! condition executors read and write it through shared references; the
//! dispatcher discards it when the run finalizes, so nothing leaks into the
//! next run.

use parking_lot::RwLock;
use serde_json::{Map, Value};

#[derive(Debug, Default)]
pub struct ExecutionContext {
    values: RwLock<Map<String, Value>>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context pre-populated with staged values (see
    /// [`WorkflowEngine::set_context_data`](crate::engine::WorkflowEngine::set_context_data)).
    pub fn seeded(values: Map<String, Value>) -> Self {
        ExecutionContext {
            values: RwLock::new(values),
        }
    }

    /// Look up a value by literal key first, then by dotted descent
    /// (`weather.cloudCover`).
    pub fn get(&self, path: &str) -> Option<Value> {
        let values = self.values.read();
        if let Some(v) = values.get(path) {
            return Some(v.clone());
        }
        let mut current: &Value = values.get(path.split('.').next()?)?;
        for segment in path.split('.').skip(1) {
            current = current.as_object()?.get(segment)?;
        }
        Some(current.clone())
    }

    /// Set a value at a dotted path, creating intermediate objects as
    /// needed. A non-object intermediate is replaced.
    pub fn set(&self, path: &str, value: Value) {
        let mut values = self.values.write();
        let mut segments = path.split('.').peekable();
        let Some(first) = segments.next() else {
            return;
        };
        if segments.peek().is_none() {
            values.insert(first.to_string(), value);
            return;
        }
        let mut current = values
            .entry(first.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        while let Some(segment) = segments.next() {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            let Some(obj) = current.as_object_mut() else {
                return;
            };
            if segments.peek().is_none() {
                obj.insert(segment.to_string(), value);
                return;
            }
            current = obj
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn snapshot(&self) -> Map<String, Value> {
        self.values.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_get_dotted() {
        let ctx = ExecutionContext::new();
        ctx.set("weather.cloudCover", json!(20));
        assert_eq!(ctx.get("weather.cloudCover"), Some(json!(20)));
        assert_eq!(ctx.get("weather"), Some(json!({ "cloudCover": 20 })));
        assert_eq!(ctx.get("weather.humidity"), None);
    }

    #[test]
    fn test_flat_key_wins_over_descent() {
        let ctx = ExecutionContext::new();
        ctx.set("a.b", json!(1));
        let flat = ExecutionContext::new();
        flat.set("literal", json!(2));
        assert_eq!(ctx.get("a.b"), Some(json!(1)));
        assert_eq!(flat.get("literal"), Some(json!(2)));
    }

    #[test]
    fn test_overwrite_non_object_intermediate() {
        let ctx = ExecutionContext::new();
        ctx.set("x", json!(5));
        ctx.set("x.y", json!(6));
        assert_eq!(ctx.get("x.y"), Some(json!(6)));
    }

    #[test]
    fn test_seeded_snapshot() {
        let mut seed = Map::new();
        seed.insert("site".to_string(), json!("obs-1"));
        let ctx = ExecutionContext::seeded(seed);
        ctx.set("run", json!(true));
        let snapshot = ctx.snapshot();
        assert_eq!(snapshot["site"], json!("obs-1"));
        assert_eq!(snapshot["run"], json!(true));
    }
}
