use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rules::{AssertRule, ExtractRule};

#[derive(Debug, Clone, Copy, ValueEnum, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    #[default]
    #[serde(alias = "GET")]
    Get,
    #[serde(alias = "POST")]
    Post,
    #[serde(alias = "PATCH")]
    Patch,
    #[serde(alias = "PUT")]
    Put,
    #[serde(alias = "DELETE")]
    Delete,
    #[serde(alias = "HEAD")]
    Head,
    #[serde(alias = "OPTIONS")]
    Options,
}

impl HttpMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

/// Which executions get a debug trace.
///
/// An empty or missing mode deserializes to [`DebugMode::Off`].
#[derive(Debug, Clone, Copy, ValueEnum, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DebugMode {
    All,
    OnlySuccess,
    OnlyError,
    #[default]
    #[serde(alias = "stop", alias = "")]
    Off,
}

/// A name/value pair that can be switched off without removing it.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl KeyValue {
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            enabled: true,
        }
    }
}

pub(crate) const fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum RequestBody {
    #[default]
    None,
    Raw(String),
    Form(Vec<KeyValue>),
    Json(serde_json::Value),
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    #[default]
    Header,
    Query,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    Basic {
        username: String,
        password: String,
    },
    Bearer {
        token: String,
    },
    ApiKey {
        key: String,
        value: String,
        #[serde(default)]
        location: ApiKeyLocation,
    },
    SigV4 {
        access_key: String,
        secret_key: String,
        session_token: Option<String>,
        region: String,
        service: String,
    },
}

/// Per-call transport settings. Deadlines live here, never in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransportOptions {
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub follow_redirects: bool,
    pub max_redirects: usize,
    pub user_agent: Option<String>,
    pub insecure: bool,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            connect_timeout: None,
            follow_redirects: true,
            max_redirects: 10,
            user_agent: None,
            insecure: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestSpec {
    pub method: HttpMethod,
    pub url: String,
    pub body: RequestBody,
    pub query: Vec<KeyValue>,
    pub headers: Vec<KeyValue>,
    pub cookies: Vec<KeyValue>,
    pub auth: Option<AuthConfig>,
    pub transport: Option<TransportOptions>,
    pub extract: Vec<ExtractRule>,
    pub assert: Vec<AssertRule>,
}

/// Identity token of an [`ApiDefinition`]. The nil UUID means unassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ApiId(Uuid);

impl ApiId {
    #[must_use]
    pub const fn unassigned() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn is_unassigned(&self) -> bool {
        self.0.is_nil()
    }
}

impl std::fmt::Display for ApiId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApiDefinition {
    pub target_id: String,
    pub name: String,
    pub request: RequestSpec,
    pub debug: DebugMode,
    pub id: ApiId,
}

impl ApiDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>, method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            request: RequestSpec {
                method,
                url: url.into(),
                ..RequestSpec::default()
            },
            ..Self::default()
        }
    }

    /// Returns the identity token, generating and storing one if still unassigned.
    pub fn ensure_id(&mut self) -> ApiId {
        if self.id.is_unassigned() {
            self.id = ApiId::generate();
        }
        self.id
    }

    /// Returns the transport options, filling in defaults if none were set.
    pub fn ensure_transport(&mut self) -> &TransportOptions {
        self.request
            .transport
            .get_or_insert_with(TransportOptions::default)
    }
}
