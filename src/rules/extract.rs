use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::http::ResponseRecord;
use crate::model::default_enabled;
use crate::vars::VariableStore;

use super::ExtractionRule;
use super::json_path::lookup;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ExtractRule {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub var: String,
    #[serde(flatten)]
    pub source: ExtractSource,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "from", rename_all = "snake_case")]
pub enum ExtractSource {
    /// Regex over the body. Yields capture group 1 when the pattern has
    /// one, otherwise the whole match; `index` picks among repeated matches.
    Body {
        pattern: String,
        #[serde(default)]
        index: usize,
    },
    Json {
        path: String,
    },
    Header {
        name: String,
    },
    Cookie {
        name: String,
    },
}

impl ExtractRule {
    #[must_use]
    pub fn new(var: impl Into<String>, source: ExtractSource) -> Self {
        Self {
            enabled: true,
            var: var.into(),
            source,
        }
    }
}

impl ExtractSource {
    fn read(&self, response: &ResponseRecord) -> Option<Value> {
        match self {
            ExtractSource::Body { pattern, index } => {
                let regex = match Regex::new(pattern) {
                    Ok(regex) => regex,
                    Err(err) => {
                        warn!("Invalid extraction pattern '{}': {}", pattern, err);
                        return None;
                    }
                };
                let body = response.body_text();
                let captures = regex.captures_iter(&body).nth(*index)?;
                let matched = captures.get(1).or_else(|| captures.get(0))?;
                Some(Value::String(matched.as_str().to_owned()))
            }
            ExtractSource::Json { path } => {
                let document: Value = match serde_json::from_slice(&response.body) {
                    Ok(document) => document,
                    Err(err) => {
                        debug!("Response body is not JSON, skipping '{}': {}", path, err);
                        return None;
                    }
                };
                lookup(&document, path).cloned()
            }
            ExtractSource::Header { name } => response
                .header(name)
                .map(|value| Value::String(value.to_owned())),
            ExtractSource::Cookie { name } => response
                .header_values("set-cookie")
                .find_map(|cookie| cookie_value(cookie, name))
                .map(|value| Value::String(value.to_owned())),
        }
    }
}

fn cookie_value<'hdr>(set_cookie: &'hdr str, name: &str) -> Option<&'hdr str> {
    let pair = set_cookie.split(';').next()?;
    let (key, value) = pair.split_once('=')?;
    (key.trim() == name).then_some(value.trim())
}

impl ExtractionRule for ExtractRule {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn variable(&self) -> &str {
        &self.var
    }

    fn extract(&self, response: &ResponseRecord, store: &VariableStore) -> Option<Value> {
        let value = self.source.read(response)?;
        store.set(self.var.clone(), value.clone());
        Some(value)
    }
}
