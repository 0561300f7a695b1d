use std::collections::BTreeMap;

use serde_json::Value;

use crate::args::RunArgs;
use crate::error::{AppError, AppResult, ConfigError};
use crate::model::{ApiDefinition, ApiId, EventContext, RequestSpec, TransportOptions};
use crate::sinks::{DB_FLUSH_SIZE, TraceWriterConfig};

use super::types::{ApiConfig, ConfigFile, DurationValue, SinkConfig, TransportConfig};

/// Everything a single run needs, after CLI overrides are applied.
#[derive(Debug)]
pub struct RunPlan {
    pub api: ApiDefinition,
    pub event: EventContext,
    pub vars: BTreeMap<String, Value>,
    /// `None` when no trace database was configured.
    pub sink: Option<TraceWriterConfig>,
}

/// Merges the config file with CLI arguments. CLI values win.
///
/// # Errors
///
/// Returns an error when no URL is available from either source or when a
/// configured duration is invalid.
pub fn apply_config(args: &RunArgs, config: Option<ConfigFile>) -> AppResult<RunPlan> {
    let ConfigFile {
        api,
        event,
        mut vars,
        sink,
    } = config.unwrap_or_default();

    let mut api = build_api_definition(api.unwrap_or_default())?;
    if let Some(url) = args.url.as_ref() {
        api.request.url.clone_from(url);
    }
    if let Some(method) = args.method {
        api.request.method = method;
    }
    if let Some(debug) = args.debug {
        api.debug = debug;
    }
    if let Some(timeout) = args.timeout {
        api.request
            .transport
            .get_or_insert_with(TransportOptions::default)
            .timeout = Some(timeout);
    }
    if api.request.url.trim().is_empty() {
        return Err(AppError::config(ConfigError::MissingApi));
    }

    for (key, value) in &args.vars {
        vars.insert(key.clone(), Value::String(value.clone()));
    }

    let sink = sink_config(args.db_url.as_deref(), sink.unwrap_or_default());

    Ok(RunPlan {
        api,
        event,
        vars,
        sink,
    })
}

/// Builds a definition from its config section. The identity token stays
/// unassigned unless the config pins one.
///
/// # Errors
///
/// Returns an error when a transport duration is invalid.
pub fn build_api_definition(config: ApiConfig) -> AppResult<ApiDefinition> {
    let transport = config
        .transport
        .as_ref()
        .map(transport_options)
        .transpose()?;
    Ok(ApiDefinition {
        target_id: config.target_id.unwrap_or_default(),
        name: config.name.unwrap_or_default(),
        request: RequestSpec {
            method: config.method.unwrap_or_default(),
            url: config.url.unwrap_or_default(),
            body: config.body.unwrap_or_default(),
            query: config.query,
            headers: config.headers,
            cookies: config.cookies,
            auth: config.auth,
            transport,
            extract: config.extract,
            assert: config.assert,
        },
        debug: config.debug.unwrap_or_default(),
        id: config.id.map_or_else(ApiId::unassigned, ApiId::from_uuid),
    })
}

fn transport_options(config: &TransportConfig) -> AppResult<TransportOptions> {
    let defaults = TransportOptions::default();
    Ok(TransportOptions {
        timeout: resolve_duration("transport.timeout", config.timeout.as_ref())?,
        connect_timeout: resolve_duration(
            "transport.connect_timeout",
            config.connect_timeout.as_ref(),
        )?,
        follow_redirects: config
            .follow_redirects
            .unwrap_or(defaults.follow_redirects),
        max_redirects: config.max_redirects.unwrap_or(defaults.max_redirects),
        user_agent: config.user_agent.clone(),
        insecure: config.insecure.unwrap_or(defaults.insecure),
    })
}

fn resolve_duration(
    field: &'static str,
    value: Option<&DurationValue>,
) -> AppResult<Option<std::time::Duration>> {
    value
        .map(|value| {
            value.to_duration().map_err(|message| {
                AppError::config(ConfigError::InvalidDuration { field, message })
            })
        })
        .transpose()
}

fn sink_config(cli_db_url: Option<&str>, config: SinkConfig) -> Option<TraceWriterConfig> {
    let db_url = cli_db_url.map(str::to_owned).or(config.db_url)?;
    Some(TraceWriterConfig {
        db_url,
        flush_size: config.flush_size.unwrap_or(DB_FLUSH_SIZE),
    })
}
