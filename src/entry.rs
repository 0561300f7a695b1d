use std::collections::BTreeMap;

use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use reqtrace::args::RunArgs;
use reqtrace::config::{RunPlan, apply_config, load_config};
use reqtrace::error::AppResult;
use reqtrace::http::ReqwestExecutor;
use reqtrace::model::{ApiDefinition, ExecutionOutcome};
use reqtrace::pipeline::Pipeline;
use reqtrace::sinks::{TraceSink, setup_trace_writer};
use reqtrace::vars::VariableStore;

/// What gets printed after a run.
#[derive(Debug, Serialize)]
struct OutcomeReport<'run> {
    api_id: String,
    name: &'run str,
    url: &'run str,
    success: bool,
    error_code: i64,
    error_message: &'run str,
    elapsed_ms: u64,
    bytes_sent: u64,
    bytes_received_kib: f64,
    started_at: String,
    ended_at: String,
    vars: BTreeMap<String, Value>,
}

impl<'run> OutcomeReport<'run> {
    fn new(
        api: &'run ApiDefinition,
        outcome: &'run ExecutionOutcome,
        vars: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            api_id: api.id.to_string(),
            name: &api.name,
            url: &api.request.url,
            success: outcome.success,
            error_code: outcome.error_code.value(),
            error_message: &outcome.error_message,
            elapsed_ms: u64::try_from(outcome.elapsed.as_millis()).unwrap_or(u64::MAX),
            bytes_sent: outcome.bytes_sent,
            bytes_received_kib: outcome.bytes_received_kib,
            started_at: outcome.started_at.to_rfc3339(),
            ended_at: outcome.ended_at.to_rfc3339(),
            vars,
        }
    }
}

pub(crate) fn run() -> AppResult<()> {
    let args = RunArgs::parse();

    reqtrace::logger::init_logging(args.verbose, args.no_color);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(args))
}

async fn run_async(args: RunArgs) -> AppResult<()> {
    let config = load_config(args.config.as_deref())?;
    let RunPlan {
        mut api,
        event,
        vars,
        sink,
    } = apply_config(&args, config)?;

    let store = VariableStore::new();
    for (key, value) in vars {
        drop(store.set(key, value));
    }

    let (trace_sink, writer) = match sink {
        Some(writer_config) => {
            let (trace_sink, trace_rx) = TraceSink::channel();
            (
                Some(trace_sink),
                Some(setup_trace_writer(writer_config, trace_rx)),
            )
        }
        None => (None, None),
    };

    let pipeline = Pipeline::new(ReqwestExecutor::new());
    let outcome = pipeline
        .execute(&event, &mut api, &store, trace_sink.as_ref())
        .await;

    drop(trace_sink);
    if let Some(writer) = writer {
        match writer.await? {
            Ok(written) => debug!("Trace writer finished with {} traces.", written),
            Err(err) => warn!("Debug traces were not persisted: {}", err),
        }
    }

    if !outcome.success {
        warn!(
            "{} failed with code {}: {}",
            api.request.url,
            outcome.error_code.value(),
            outcome.error_message
        );
    }

    let report = OutcomeReport::new(&api, &outcome, store.snapshot());
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
