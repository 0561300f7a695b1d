use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::model::{AuthConfig, DebugMode, EventContext, HttpMethod, KeyValue, RequestBody};
use crate::rules::{AssertRule, ExtractRule};

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub api: Option<ApiConfig>,
    #[serde(default)]
    pub event: EventContext,
    /// Seeds the variable store before the run.
    #[serde(default)]
    pub vars: BTreeMap<String, Value>,
    pub sink: Option<SinkConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiConfig {
    pub name: Option<String>,
    pub target_id: Option<String>,
    /// Pins the identity token instead of generating one on first run.
    pub id: Option<Uuid>,
    pub method: Option<HttpMethod>,
    pub url: Option<String>,
    pub body: Option<RequestBody>,
    #[serde(default)]
    pub query: Vec<KeyValue>,
    #[serde(default)]
    pub headers: Vec<KeyValue>,
    #[serde(default)]
    pub cookies: Vec<KeyValue>,
    pub auth: Option<AuthConfig>,
    pub transport: Option<TransportConfig>,
    #[serde(default)]
    pub extract: Vec<ExtractRule>,
    #[serde(default)]
    pub assert: Vec<AssertRule>,
    pub debug: Option<DebugMode>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransportConfig {
    pub timeout: Option<DurationValue>,
    pub connect_timeout: Option<DurationValue>,
    pub follow_redirects: Option<bool>,
    pub max_redirects: Option<usize>,
    pub user_agent: Option<String>,
    pub insecure: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SinkConfig {
    pub db_url: Option<String>,
    pub flush_size: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, String> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err("Duration must be > 0.".to_owned())
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(text) => super::parse_duration_value(text),
        }
    }
}
