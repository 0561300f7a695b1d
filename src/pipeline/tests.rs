use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use serde_json::json;
use tokio::sync::mpsc;

use super::*;
use crate::error::HttpError;
use crate::http::{ExchangeBuffers, ExecutionFacts, RequestExecutor, ResponseRecord};
use crate::model::{
    ApiDefinition, AssertionResult, DebugMode, ErrorCode, EventContext, HttpMethod, RequestBody,
    RequestSpec, TransportOptions,
};
use crate::rules::{AssertCheck, AssertRule, AssertionRule, Compare, ExtractRule, ExtractSource};
use crate::sinks::TraceSink;
use crate::vars::VariableStore;

#[derive(Debug, Default)]
struct FakeExecutor {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    content_length: i64,
    fail: bool,
    sent_body: Vec<u8>,
}

impl FakeExecutor {
    fn ok(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_owned(), "application/json".to_owned())],
            body: body.as_bytes().to_vec(),
            content_length: -1,
            fail: false,
            sent_body: Vec::new(),
        }
    }
}

#[async_trait]
impl RequestExecutor for FakeExecutor {
    async fn execute(
        &self,
        spec: &RequestSpec,
        _options: &TransportOptions,
        _store: &VariableStore,
        exchange: &mut ExchangeBuffers,
    ) -> ExecutionFacts {
        exchange.request.method = spec.method.as_str().to_owned();
        exchange.request.url.clone_from(&spec.url);
        if let RequestBody::Raw(text) = &spec.body {
            exchange.request.body = text.as_bytes().to_vec();
        }
        if !self.sent_body.is_empty() {
            exchange.request.body.clone_from(&self.sent_body);
        }
        exchange.response.status = self.status;
        exchange.response.headers.clone_from(&self.headers);
        exchange.response.body.clone_from(&self.body);
        exchange.response.content_length = self.content_length;

        let error = self.fail.then_some(HttpError::InvalidUrl {
            url: spec.url.clone(),
            source: url::ParseError::EmptyHost,
        });
        let now = Local::now();
        ExecutionFacts {
            elapsed: Duration::from_millis(12),
            bytes_sent: 64,
            error,
            body_text: String::new(),
            started_at: now,
            ended_at: now,
        }
    }
}

struct FixedRule {
    enabled: bool,
    result: AssertionResult,
}

impl AssertionRule for FixedRule {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn check(&self, _response: &ResponseRecord) -> AssertionResult {
        self.result.clone()
    }
}

fn fixed(enabled: bool, result: AssertionResult) -> FixedRule {
    FixedRule { enabled, result }
}

fn run_async<F>(future: F) -> Result<(), String>
where
    F: std::future::Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

fn api(debug: DebugMode) -> ApiDefinition {
    let mut api = ApiDefinition::new("login", HttpMethod::Post, "http://example.test/login");
    api.target_id = "target-1".to_owned();
    api.debug = debug;
    api
}

fn status_rule(value: u16) -> AssertRule {
    AssertRule::new(AssertCheck::Status {
        op: Compare::Equal,
        value,
    })
}

fn recv_trace(rx: &mut mpsc::UnboundedReceiver<DebugTrace>) -> Result<DebugTrace, String> {
    rx.try_recv()
        .map_err(|err| format!("Expected a debug trace: {}", err))
}

#[test]
fn last_failing_assertion_decides_code_and_message() -> Result<(), String> {
    let rules = [
        fixed(true, AssertionResult::failed(ErrorCode(5), "first")),
        fixed(true, AssertionResult::passed("middle")),
        fixed(true, AssertionResult::failed(ErrorCode(6), "second")),
    ];
    let summary = evaluate_assertions(&ResponseRecord::default(), &rules);
    if summary.success {
        return Err("Summary should fail".to_owned());
    }
    if summary.code != ErrorCode(6) || summary.message != "second" {
        return Err(format!(
            "Unexpected verdict: {:?} {}",
            summary.code, summary.message
        ));
    }
    if summary.evaluated != 3 || summary.failed != 2 || summary.results.len() != 3 {
        return Err(format!("Unexpected counts: {:?}", summary));
    }
    Ok(())
}

#[test]
fn disabled_and_missing_assertions_succeed() -> Result<(), String> {
    let empty: [FixedRule; 0] = [];
    let summary = evaluate_assertions(&ResponseRecord::default(), &empty);
    if summary != AssertionSummary::default() {
        return Err(format!("Empty rule list should succeed: {:?}", summary));
    }

    let rules = [fixed(false, AssertionResult::failed(ErrorCode(5), "off"))];
    let summary = evaluate_assertions(&ResponseRecord::default(), &rules);
    if !summary.success || summary.evaluated != 0 || !summary.results.is_empty() {
        return Err(format!("Disabled rules should be skipped: {:?}", summary));
    }
    Ok(())
}

#[test]
fn disabled_extract_rules_are_skipped_and_later_rules_win() -> Result<(), String> {
    let response = ResponseRecord {
        status: 200,
        headers: vec![
            ("x-first".to_owned(), "one".to_owned()),
            ("x-second".to_owned(), "two".to_owned()),
        ],
        ..ResponseRecord::default()
    };
    let header = |name: &str| ExtractSource::Header {
        name: name.to_owned(),
    };
    let store = VariableStore::new();

    let disabled = ExtractRule {
        enabled: false,
        ..ExtractRule::new("hidden", header("x-first"))
    };
    let extracted = extract_variables(&response, &[disabled], &store);
    if !extracted.is_empty() || store.contains("hidden") {
        return Err(format!("Disabled rule should not run: {:?}", extracted));
    }

    let rules = [
        ExtractRule::new("id", header("x-first")),
        ExtractRule::new("id", header("x-second")),
    ];
    let extracted = extract_variables(&response, &rules, &store);
    let expected = vec![
        ExtractedVar {
            name: "id".to_owned(),
            value: json!("one"),
        },
        ExtractedVar {
            name: "id".to_owned(),
            value: json!("two"),
        },
    ];
    if extracted != expected {
        return Err(format!("Both rules should be listed: {:?}", extracted));
    }
    if store.get("id") != Some(json!("two")) {
        return Err(format!("Later rule should win: {:?}", store.get("id")));
    }
    Ok(())
}

#[test]
fn received_kib_prefers_declared_length() -> Result<(), String> {
    let mut response = ResponseRecord {
        body: vec![b'x'; 2048],
        content_length: 0,
        ..ResponseRecord::default()
    };
    if received_kib(&response).to_string() != "2" {
        return Err(format!(
            "Zero content length should fall back to body: {}",
            received_kib(&response)
        ));
    }
    response.content_length = 1024;
    if received_kib(&response).to_string() != "1" {
        return Err(format!(
            "Declared length should win: {}",
            received_kib(&response)
        ));
    }
    Ok(())
}

#[test]
fn capture_filter_follows_debug_mode() -> Result<(), String> {
    let cases = [
        (DebugMode::All, true, true),
        (DebugMode::All, false, true),
        (DebugMode::OnlySuccess, true, true),
        (DebugMode::OnlySuccess, false, false),
        (DebugMode::OnlyError, true, false),
        (DebugMode::OnlyError, false, true),
        (DebugMode::Off, true, false),
        (DebugMode::Off, false, false),
    ];
    for (mode, success, expected) in cases {
        if should_capture(mode, success) != expected {
            return Err(format!("Unexpected capture for {:?}/{}", mode, success));
        }
    }
    Ok(())
}

#[test]
fn successful_run_reports_metrics_and_extracts() -> Result<(), String> {
    run_async(async {
        let pipeline = Pipeline::new(FakeExecutor::ok(200, r#"{"token":"abc"}"#));
        let store = VariableStore::new();
        let mut api = api(DebugMode::Off);
        api.request.extract.push(ExtractRule::new(
            "token",
            ExtractSource::Json {
                path: "$.token".to_owned(),
            },
        ));
        api.request.assert.push(status_rule(200));

        let outcome = pipeline
            .execute(&EventContext::default(), &mut api, &store, None)
            .await;
        if !outcome.success || outcome.error_code != ErrorCode::NO_ERROR {
            return Err(format!("Expected success: {:?}", outcome));
        }
        if !outcome.error_message.is_empty() {
            return Err(format!("Unexpected message: {}", outcome.error_message));
        }
        if outcome.elapsed != Duration::from_millis(12) || outcome.bytes_sent != 64 {
            return Err(format!("Executor facts should pass through: {:?}", outcome));
        }
        if store.get("token") != Some(json!("abc")) {
            return Err("Extracted token missing from store".to_owned());
        }
        if pipeline.pool().idle_len() != 1 {
            return Err("Exchange buffers should return to the pool".to_owned());
        }
        Ok(())
    })
}

#[test]
fn transport_error_still_extracts_and_keeps_no_error_code() -> Result<(), String> {
    run_async(async {
        let executor = FakeExecutor {
            fail: true,
            ..FakeExecutor::ok(0, "partial=yes")
        };
        let pipeline = Pipeline::new(executor);
        let store = VariableStore::new();
        let mut api = api(DebugMode::Off);
        api.request.extract.push(ExtractRule::new(
            "partial",
            ExtractSource::Body {
                pattern: r"partial=(\w+)".to_owned(),
                index: 0,
            },
        ));

        let outcome = pipeline
            .execute(&EventContext::default(), &mut api, &store, None)
            .await;
        if outcome.success {
            return Err("Transport error should fail the run".to_owned());
        }
        if outcome.error_code != ErrorCode::NO_ERROR {
            return Err(format!("Unexpected code: {:?}", outcome.error_code));
        }
        if !outcome.error_message.contains("Invalid URL") {
            return Err(format!("Unexpected message: {}", outcome.error_message));
        }
        if store.get("partial") != Some(json!("yes")) {
            return Err("Extraction should run on partial responses".to_owned());
        }
        Ok(())
    })
}

#[test]
fn assertion_failure_overrides_transport_message() -> Result<(), String> {
    run_async(async {
        let executor = FakeExecutor {
            fail: true,
            ..FakeExecutor::ok(500, "")
        };
        let pipeline = Pipeline::new(executor);
        let mut api = api(DebugMode::Off);
        api.request.assert.push(status_rule(200));

        let outcome = pipeline
            .execute(
                &EventContext::default(),
                &mut api,
                &VariableStore::new(),
                None,
            )
            .await;
        if outcome.success || outcome.error_code != ErrorCode::STATUS_ASSERT_FAILED {
            return Err(format!("Unexpected outcome: {:?}", outcome));
        }
        if outcome.error_message.contains("Invalid URL") {
            return Err("Assertion message should replace transport text".to_owned());
        }
        Ok(())
    })
}

#[test]
fn only_error_mode_traces_failures_only() -> Result<(), String> {
    run_async(async {
        let (sink, mut rx) = TraceSink::channel();
        let store = VariableStore::new();
        let event = EventContext {
            id: "event-7".to_owned(),
            report_id: "report-1".to_owned(),
            next_list: vec!["event-8".to_owned()],
            ..EventContext::default()
        };

        let passing = Pipeline::new(FakeExecutor::ok(200, "ok"));
        let mut api = api(DebugMode::OnlyError);
        api.request.assert.push(status_rule(200));
        let outcome = passing.execute(&event, &mut api, &store, Some(&sink)).await;
        if !outcome.success {
            return Err(format!("Expected success: {:?}", outcome));
        }
        if rx.try_recv().is_ok() {
            return Err("Successful run should not be traced".to_owned());
        }

        let failing = Pipeline::new(FakeExecutor::ok(404, "missing"));
        let outcome = failing.execute(&event, &mut api, &store, Some(&sink)).await;
        if outcome.success {
            return Err("Expected failure".to_owned());
        }
        let trace = recv_trace(&mut rx)?;
        if trace.status != TraceStatus::Failed || trace.request_code != 404 {
            return Err(format!("Unexpected trace: {:?}", trace));
        }
        if trace.event_id != "event-7" || trace.report_id != "report-1" {
            return Err(format!("Event context not carried: {:?}", trace));
        }
        if trace.next_list != vec!["event-8".to_owned()] || trace.api_id != "target-1" {
            return Err(format!("Identifiers not carried: {:?}", trace));
        }
        if trace.assertion_count != 1 || trace.assertion_failed_count != 1 {
            return Err(format!("Unexpected assertion counts: {:?}", trace));
        }
        if trace.response_body != "missing" || trace.kind != "api" {
            return Err(format!("Unexpected trace body: {:?}", trace));
        }
        Ok(())
    })
}

#[test]
fn trace_decodes_request_body_and_rounds_size() -> Result<(), String> {
    run_async(async {
        let (sink, mut rx) = TraceSink::channel();
        let executor = FakeExecutor {
            content_length: 1234,
            ..FakeExecutor::ok(200, "")
        };
        let pipeline = Pipeline::new(executor);
        let mut api = api(DebugMode::All);

        api.request.body = RequestBody::Raw("a%20b+c".to_owned());
        pipeline
            .execute(
                &EventContext::default(),
                &mut api,
                &VariableStore::new(),
                Some(&sink),
            )
            .await;
        let trace = recv_trace(&mut rx)?;
        if trace.request_body != "a b c" {
            return Err(format!("Body should be unescaped: {}", trace.request_body));
        }
        if trace.response_bytes.to_string() != "1.21" {
            return Err(format!("Unexpected size: {}", trace.response_bytes));
        }
        if trace.request_time != 12 {
            return Err(format!("Unexpected request time: {}", trace.request_time));
        }

        api.request.body = RequestBody::Raw("100%zz".to_owned());
        pipeline
            .execute(
                &EventContext::default(),
                &mut api,
                &VariableStore::new(),
                Some(&sink),
            )
            .await;
        let trace = recv_trace(&mut rx)?;
        if trace.request_body != "100%zz" {
            return Err(format!("Malformed escape should stay raw: {}", trace.request_body));
        }
        Ok(())
    })
}

#[test]
fn trace_keeps_non_utf8_request_body_as_lossy_text() -> Result<(), String> {
    run_async(async {
        let (sink, mut rx) = TraceSink::channel();
        for (sent, expected) in [
            (b"caf%C3%A9".to_vec(), "caf\u{e9}"),
            (b"a+%41\xff".to_vec(), "a+%41\u{fffd}"),
            (b"%ff".to_vec(), "%ff"),
        ] {
            let pipeline = Pipeline::new(FakeExecutor {
                sent_body: sent,
                ..FakeExecutor::ok(200, "")
            });
            let mut api = api(DebugMode::All);
            pipeline
                .execute(
                    &EventContext::default(),
                    &mut api,
                    &VariableStore::new(),
                    Some(&sink),
                )
                .await;
            let trace = recv_trace(&mut rx)?;
            if trace.request_body != expected {
                return Err(format!(
                    "Expected {:?}, got {:?}",
                    expected, trace.request_body
                ));
            }
        }
        Ok(())
    })
}

#[test]
fn trace_lists_extracted_values_in_order() -> Result<(), String> {
    run_async(async {
        let (sink, mut rx) = TraceSink::channel();
        let pipeline = Pipeline::new(FakeExecutor::ok(200, r#"{"a":1,"b":"two"}"#));
        let mut api = api(DebugMode::OnlySuccess);
        for (var, path) in [("first", "a"), ("missing", "nope"), ("second", "b")] {
            api.request.extract.push(ExtractRule::new(
                var,
                ExtractSource::Json {
                    path: path.to_owned(),
                },
            ));
        }
        pipeline
            .execute(
                &EventContext::default(),
                &mut api,
                &VariableStore::new(),
                Some(&sink),
            )
            .await;
        let trace = recv_trace(&mut rx)?;
        if trace.extracted != vec![json!({"first": 1}), json!({"second": "two"})] {
            return Err(format!("Unexpected extracted list: {:?}", trace.extracted));
        }
        if trace.status != TraceStatus::Success {
            return Err("Trace should record success".to_owned());
        }
        Ok(())
    })
}

#[test]
fn identity_token_is_assigned_once_and_persisted() -> Result<(), String> {
    run_async(async {
        let (sink, mut rx) = TraceSink::channel();
        let pipeline = Pipeline::new(FakeExecutor::ok(200, ""));
        let store = VariableStore::new();
        let mut api = api(DebugMode::All);
        if !api.id.is_unassigned() || api.request.transport.is_some() {
            return Err("Fresh definition should be unassigned".to_owned());
        }

        pipeline
            .execute(&EventContext::default(), &mut api, &store, Some(&sink))
            .await;
        let assigned = api.id;
        if assigned.is_unassigned() || api.request.transport.is_none() {
            return Err("First run should persist identity and transport".to_owned());
        }
        pipeline
            .execute(&EventContext::default(), &mut api, &store, Some(&sink))
            .await;
        if api.id != assigned {
            return Err("Identity should not change between runs".to_owned());
        }

        let first = recv_trace(&mut rx)?;
        let second = recv_trace(&mut rx)?;
        if first.uuid != assigned.to_string() || second.uuid != first.uuid {
            return Err(format!("Trace uuids differ: {} {}", first.uuid, second.uuid));
        }
        Ok(())
    })
}

#[test]
fn closed_sink_does_not_affect_outcome() -> Result<(), String> {
    run_async(async {
        let (sink, rx) = TraceSink::channel();
        drop(rx);
        let pipeline = Pipeline::new(FakeExecutor::ok(200, ""));
        let mut api = api(DebugMode::All);
        let outcome = pipeline
            .execute(
                &EventContext::default(),
                &mut api,
                &VariableStore::new(),
                Some(&sink),
            )
            .await;
        if !outcome.success {
            return Err(format!("Outcome should ignore sink state: {:?}", outcome));
        }
        Ok(())
    })
}
