//! Normalization boundary for loosely-typed matching signals
//!
//! The backend stores profile and pod attributes inconsistently: the
//! same field may hold a plain string, a list, or a list serialized as
//! a JSON string. Everything funnels through `normalize` before
//! scoring so the scorer only ever sees canonical token sets.

use serde_json::Value;
use std::collections::BTreeSet;

/// Convert an attribute value into a canonical set of lowercase,
/// trimmed tokens.
///
/// Total over all input shapes; non-representable input degrades to an
/// empty set rather than erroring, because matching signals are
/// optional and partial data must not fail the pipeline.
pub fn normalize(value: &Value) -> BTreeSet<String> {
    match value {
        Value::Null => BTreeSet::new(),
        Value::String(s) => normalize_str(s),
        Value::Array(items) => items.iter().flat_map(normalize_element).collect(),
        _ => BTreeSet::new(),
    }
}

/// A string is either an embedded JSON collection or a single token.
fn normalize_str(s: &str) -> BTreeSet<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return BTreeSet::new();
    }

    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        if let Ok(parsed) = serde_json::from_str::<Value>(trimmed) {
            return match &parsed {
                Value::Array(_) => normalize(&parsed),
                Value::Object(map) => map.values().flat_map(normalize_element).collect(),
                _ => BTreeSet::new(),
            };
        }
    }

    let mut set = BTreeSet::new();
    set.insert(trimmed.to_lowercase());
    set
}

/// Elements inside a collection also admit numbers and bools, which
/// keep their display form.
fn normalize_element(value: &Value) -> BTreeSet<String> {
    match value {
        Value::Number(n) => {
            let mut set = BTreeSet::new();
            set.insert(n.to_string());
            set
        }
        Value::Bool(b) => {
            let mut set = BTreeSet::new();
            set.insert(b.to_string());
            set
        }
        Value::Object(map) => map.values().flat_map(normalize_element).collect(),
        other => normalize(other),
    }
}
