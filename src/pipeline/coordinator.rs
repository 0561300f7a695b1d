use tracing::debug;

use crate::http::{ExchangePool, ReqwestExecutor, RequestExecutor};
use crate::model::{ApiDefinition, ErrorCode, EventContext, ExecutionOutcome};
use crate::sinks::TraceSink;
use crate::vars::VariableStore;

use super::assertions::evaluate_assertions;
use super::extract::extract_variables;
use super::metrics::TrafficMetrics;
use super::trace::{TraceInput, build_trace, should_capture};

/// Runs one API definition end to end: request, extraction, assertions,
/// metrics, and the optional debug trace.
///
/// A `Pipeline` holds no per-run state and can be shared across tasks.
#[derive(Debug, Default)]
pub struct Pipeline<E = ReqwestExecutor> {
    executor: E,
    pool: ExchangePool,
}

impl<E> Pipeline<E>
where
    E: RequestExecutor,
{
    #[must_use]
    pub fn new(executor: E) -> Self {
        Self::with_pool(executor, ExchangePool::default())
    }

    #[must_use]
    pub const fn with_pool(executor: E, pool: ExchangePool) -> Self {
        Self { executor, pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &ExchangePool {
        &self.pool
    }

    /// Executes `api` once and returns the functional outcome.
    ///
    /// Transport and assertion failures are reported through the outcome;
    /// trace delivery problems are logged and otherwise ignored. `api` is
    /// borrowed mutably only to persist its identity token and default
    /// transport options.
    pub async fn execute(
        &self,
        event: &EventContext,
        api: &mut ApiDefinition,
        store: &VariableStore,
        sink: Option<&TraceSink>,
    ) -> ExecutionOutcome {
        api.ensure_id();
        api.ensure_transport();
        let api: &ApiDefinition = api;
        let options = api.request.transport.clone().unwrap_or_default();

        let mut exchange = self.pool.checkout();
        let facts = self
            .executor
            .execute(&api.request, &options, store, &mut exchange)
            .await;

        let mut success = true;
        let mut error_code = ErrorCode::NO_ERROR;
        let mut error_message = String::new();

        let extracted = extract_variables(&exchange.response, &api.request.extract, store);
        if let Some(err) = facts.error.as_ref() {
            success = false;
            error_message = err.to_string();
        }

        let assertions = evaluate_assertions(&exchange.response, &api.request.assert);
        if !assertions.success {
            success = false;
            error_code = assertions.code;
            error_message.clone_from(&assertions.message);
        }

        let metrics = TrafficMetrics::compute(&exchange.response, &facts);

        if should_capture(api.debug, success) {
            let trace = build_trace(TraceInput {
                event,
                api,
                exchange: &exchange,
                facts: &facts,
                metrics: &metrics,
                assertions: &assertions,
                extracted: &extracted,
                success,
            });
            if let Some(sink) = sink
                && !sink.submit(trace)
            {
                debug!("Trace sink closed; dropping debug trace for {}.", api.name);
            }
        }

        ExecutionOutcome {
            success,
            error_code,
            elapsed: metrics.elapsed,
            bytes_sent: metrics.bytes_sent,
            bytes_received_kib: metrics.bytes_received_kib,
            error_message,
            started_at: facts.started_at,
            ended_at: facts.ended_at,
        }
    }
}
