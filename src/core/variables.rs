//! `${path}` variable substitution.
//!
//! Config string values exactly matching `${path}` are replaced by the
//! value at `path` in the workflow's variable mapping, preserving the
//! resolved value's type. Resolution tries the literal (possibly dotted)
//! key first and falls back to dotted descent into nested objects.
//! Unresolved references are left untouched; substitution never fails.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::model::Node;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$\{([^}]+)\}$").expect("placeholder pattern is valid")
});

/// Resolve a variable reference path against the mapping.
pub fn resolve_path<'a>(variables: &'a HashMap<String, Value>, path: &str) -> Option<&'a Value> {
    if let Some(v) = variables.get(path) {
        return Some(v);
    }
    let mut segments = path.split('.');
    let mut current = variables.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Return a copy of the node with every `${path}` reference in its config
/// resolved. The input node and variable mapping are not mutated.
pub fn substitute_variables(node: &Node, variables: &HashMap<String, Value>) -> Node {
    let mut substituted = node.clone();
    for value in substituted.config.values_mut() {
        substitute_value(value, variables);
    }
    substituted
}

/// Deep walk: objects and arrays are descended, strings are checked against
/// the placeholder form.
fn substitute_value(value: &mut Value, variables: &HashMap<String, Value>) {
    match value {
        Value::String(s) => {
            if let Some(caps) = PLACEHOLDER.captures(s) {
                if let Some(resolved) = resolve_path(variables, caps[1].trim()) {
                    *value = resolved.clone();
                }
            }
        }
        Value::Object(map) => {
            for v in map.values_mut() {
                substitute_value(v, variables);
            }
        }
        Value::Array(items) => {
            for v in items.iter_mut() {
                substitute_value(v, variables);
            }
        }
        _ => {}
    }
}
