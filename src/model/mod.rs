//! API definitions, event context, and execution results.
mod api;
mod event;
mod outcome;

#[cfg(test)]
mod tests;

pub use api::{
    ApiDefinition, ApiId, ApiKeyLocation, AuthConfig, DebugMode, HttpMethod, KeyValue,
    RequestBody, RequestSpec, TransportOptions,
};
pub(crate) use api::default_enabled;
pub use event::EventContext;
pub use outcome::{AssertionResult, ErrorCode, ExecutionOutcome};

pub(crate) const DEFAULT_USER_AGENT: &str = concat!("reqtrace/", env!("CARGO_PKG_VERSION"));
