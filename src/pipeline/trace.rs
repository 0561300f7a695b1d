use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::http::{ExchangeBuffers, ExecutionFacts};
use crate::model::{ApiDefinition, AssertionResult, DebugMode, EventContext};

use super::assertions::AssertionSummary;
use super::extract::ExtractedVar;
use super::metrics::TrafficMetrics;

const TRACE_KIND: &str = "api";
const RESPONSE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceStatus {
    Success,
    Failed,
}

impl TraceStatus {
    #[must_use]
    pub const fn from_success(success: bool) -> Self {
        if success {
            TraceStatus::Success
        } else {
            TraceStatus::Failed
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TraceStatus::Success => "success",
            TraceStatus::Failed => "failed",
        }
    }
}

/// Flat diagnostic record of one execution.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DebugTrace {
    pub team_id: String,
    pub plan_id: String,
    pub report_id: String,
    pub scene_id: String,
    pub parent_id: String,
    pub case_id: String,
    pub uuid: String,
    pub event_id: String,
    pub api_id: String,
    pub api_name: String,
    pub request_url: String,
    pub method: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Elapsed time in whole milliseconds.
    pub request_time: u64,
    pub request_code: u16,
    pub request_header: String,
    pub request_body: String,
    /// End of the exchange, `YYYY-MM-DD HH:MM:SS` local time.
    pub response_time: String,
    pub response_header: String,
    pub response_body: String,
    /// KiB received, two decimals.
    pub response_bytes: f64,
    pub status: TraceStatus,
    pub next_list: Vec<String>,
    #[serde(rename = "assert")]
    pub assertions: Vec<AssertionResult>,
    #[serde(rename = "assert_num")]
    pub assertion_count: usize,
    #[serde(rename = "assert_failed_num")]
    pub assertion_failed_count: usize,
    #[serde(rename = "regex")]
    pub extracted: Vec<Value>,
}

/// Everything the trace is built from.
pub struct TraceInput<'run> {
    pub event: &'run EventContext,
    pub api: &'run ApiDefinition,
    pub exchange: &'run ExchangeBuffers,
    pub facts: &'run ExecutionFacts,
    pub metrics: &'run TrafficMetrics,
    pub assertions: &'run AssertionSummary,
    pub extracted: &'run [ExtractedVar],
    pub success: bool,
}

/// Capture filter over the four debug modes.
#[must_use]
pub const fn should_capture(mode: DebugMode, success: bool) -> bool {
    match mode {
        DebugMode::All => true,
        DebugMode::OnlySuccess => success,
        DebugMode::OnlyError => !success,
        DebugMode::Off => false,
    }
}

#[must_use]
pub fn build_trace(input: TraceInput<'_>) -> DebugTrace {
    let TraceInput {
        event,
        api,
        exchange,
        facts,
        metrics,
        assertions,
        extracted,
        success,
    } = input;

    DebugTrace {
        team_id: event.team_id.clone(),
        plan_id: event.plan_id.clone(),
        report_id: event.report_id.clone(),
        scene_id: event.scene_id.clone(),
        parent_id: event.parent_id.clone(),
        case_id: event.case_id.clone(),
        uuid: api.id.to_string(),
        event_id: event.id.clone(),
        api_id: api.target_id.clone(),
        api_name: api.name.clone(),
        request_url: exchange.request.url.clone(),
        method: exchange.request.method.clone(),
        kind: TRACE_KIND.to_owned(),
        request_time: u64::try_from(facts.elapsed.as_millis()).unwrap_or(u64::MAX),
        request_code: exchange.response.status,
        request_header: exchange.request.headers_text(),
        request_body: request_body_text(&exchange.request.body, &facts.body_text),
        response_time: facts.ended_at.format(RESPONSE_TIME_FORMAT).to_string(),
        response_header: exchange.response.headers_text(),
        response_body: response_body_text(exchange, facts),
        response_bytes: round_hundredths(metrics.bytes_received_kib),
        status: TraceStatus::from_success(success),
        next_list: event.next_list.clone(),
        assertions: assertions.results.clone(),
        assertion_count: assertions.evaluated,
        assertion_failed_count: assertions.failed,
        extracted: extracted
            .iter()
            .map(|var| {
                let mut entry = serde_json::Map::with_capacity(1);
                entry.insert(var.name.clone(), var.value.clone());
                Value::Object(entry)
            })
            .collect(),
    }
}

/// Recorded body, URL-decoded when possible. An empty recorded body falls
/// back to the executor's rendered text. The raw fallback replaces invalid
/// UTF-8 with U+FFFD.
fn request_body_text(body: &[u8], fallback: &str) -> String {
    if body.is_empty() {
        return fallback.to_owned();
    }
    query_unescape(body).unwrap_or_else(|| {
        debug!("Request body is not URL-encoded; storing raw text.");
        String::from_utf8_lossy(body).into_owned()
    })
}

/// Transport error text when there is one, otherwise the received body.
fn response_body_text(exchange: &ExchangeBuffers, facts: &ExecutionFacts) -> String {
    match facts.error.as_ref() {
        Some(err) => err.to_string(),
        None => exchange.response.body_text().into_owned(),
    }
}

/// Query-string unescaping: `+` is a space and `%XX` must be a valid escape.
/// Returns `None` on a malformed escape or when the result is not UTF-8.
fn query_unescape(input: &[u8]) -> Option<String> {
    let mut decoded = Vec::with_capacity(input.len());
    let mut bytes = input.iter().copied();
    while let Some(byte) = bytes.next() {
        match byte {
            b'+' => decoded.push(b' '),
            b'%' => {
                let high = bytes.next().and_then(hex_value)?;
                let low = bytes.next().and_then(hex_value)?;
                decoded.push(high.checked_mul(16)?.checked_add(low)?);
            }
            other => decoded.push(other),
        }
    }
    String::from_utf8(decoded).ok()
}

fn hex_value(byte: u8) -> Option<u8> {
    char::from(byte)
        .to_digit(16)
        .and_then(|digit| u8::try_from(digit).ok())
}

fn round_hundredths(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}
