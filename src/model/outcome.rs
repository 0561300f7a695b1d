use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ErrorCode(pub i64);

impl ErrorCode {
    pub const NO_ERROR: Self = Self(10_000);
    pub const STATUS_ASSERT_FAILED: Self = Self(10_001);
    pub const BODY_ASSERT_FAILED: Self = Self(10_002);
    pub const HEADER_ASSERT_FAILED: Self = Self(10_003);
    pub const JSON_ASSERT_FAILED: Self = Self(10_004);
    pub const INVALID_ASSERTION: Self = Self(10_005);

    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl Default for ErrorCode {
    fn default() -> Self {
        Self::NO_ERROR
    }
}

/// Verdict of one evaluated assertion rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AssertionResult {
    pub code: ErrorCode,
    #[serde(rename = "is_succeed")]
    pub success: bool,
    #[serde(rename = "msg")]
    pub message: String,
}

impl AssertionResult {
    #[must_use]
    pub fn passed(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::NO_ERROR,
            success: true,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn failed(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            success: false,
            message: message.into(),
        }
    }
}

/// Functional result of one pipeline run. Telemetry is a side effect.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub error_code: ErrorCode,
    pub elapsed: Duration,
    pub bytes_sent: u64,
    pub bytes_received_kib: f64,
    pub error_message: String,
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
}
