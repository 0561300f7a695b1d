//! Run-scoped variable store shared by concurrent pipeline invocations.
use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;

/// Concurrent string-keyed map. Clones share the same underlying store.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    inner: Arc<DashMap<String, Value>>,
}

impl VariableStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.get(key).map(|entry| entry.value().clone())
    }

    /// Stores `value` under `key` and returns the previous value, if any.
    pub fn set(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.inner.insert(key.into(), value)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.inner
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Replaces `{{name}}` placeholders with stored values.
    /// Unknown names are left in place.
    #[must_use]
    pub fn render(&self, input: &str) -> String {
        let mut rest = input;
        let mut output = String::with_capacity(input.len());

        loop {
            let Some(start) = rest.find("{{") else {
                output.push_str(rest);
                break;
            };
            let (before, after_start) = rest.split_at(start);
            output.push_str(before);
            let Some(after) = after_start.strip_prefix("{{") else {
                output.push_str(after_start);
                break;
            };
            let Some(end) = after.find("}}") else {
                output.push_str("{{");
                output.push_str(after);
                break;
            };
            let (key_part, after_end) = after.split_at(end);
            let key = key_part.trim();
            if let Some(value) = self.get(key) {
                output.push_str(&value_text(&value));
            } else {
                output.push_str("{{");
                output.push_str(key);
                output.push_str("}}");
            }
            rest = match after_end.strip_prefix("}}") {
                Some(remaining) => remaining,
                None => {
                    output.push_str(after_end);
                    break;
                }
            };
        }

        output
    }

    /// Renders every string leaf and object key of `value`. Substituted text
    /// stays inside its JSON string, so quotes in stored values are escaped
    /// when the tree is serialized.
    #[must_use]
    pub fn render_json(&self, value: &Value) -> Value {
        match value {
            Value::String(text) => Value::String(self.render(text)),
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| self.render_json(item)).collect())
            }
            Value::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(key, field)| (self.render(key), self.render_json(field)))
                    .collect(),
            ),
            Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
        }
    }
}

/// Text form of a stored value: strings unquoted, everything else as JSON.
#[must_use]
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
