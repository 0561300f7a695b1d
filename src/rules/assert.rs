use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::ResponseRecord;
use crate::model::{AssertionResult, ErrorCode, default_enabled};
use crate::vars::value_text;

use super::AssertionRule;
use super::json_path::lookup;

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Compare {
    #[default]
    Equal,
    NotEqual,
    Contains,
    NotContains,
}

impl Compare {
    #[must_use]
    pub fn matches(self, actual: &str, expected: &str) -> bool {
        match self {
            Compare::Equal => actual == expected,
            Compare::NotEqual => actual != expected,
            Compare::Contains => actual.contains(expected),
            Compare::NotContains => !actual.contains(expected),
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Compare::Equal => "equals",
            Compare::NotEqual => "does not equal",
            Compare::Contains => "contains",
            Compare::NotContains => "does not contain",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AssertRule {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(flatten)]
    pub check: AssertCheck,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum AssertCheck {
    Status {
        #[serde(default)]
        op: Compare,
        value: u16,
    },
    Body {
        #[serde(default)]
        op: Compare,
        value: String,
    },
    BodyRegex {
        pattern: String,
    },
    Header {
        name: String,
        #[serde(default)]
        op: Compare,
        value: String,
    },
    /// Compares the text form of the value at `path`, so `1` and `"1"` are equal.
    Json {
        path: String,
        #[serde(default)]
        op: Compare,
        value: Value,
    },
}

impl AssertRule {
    #[must_use]
    pub const fn new(check: AssertCheck) -> Self {
        Self {
            enabled: true,
            check,
        }
    }
}

fn verdict(passed: bool, code: ErrorCode, subject: String) -> AssertionResult {
    if passed {
        AssertionResult::passed(format!("{}: passed", subject))
    } else {
        AssertionResult::failed(code, format!("{}: failed", subject))
    }
}

impl AssertCheck {
    fn run(&self, response: &ResponseRecord) -> AssertionResult {
        match self {
            AssertCheck::Status { op, value } => {
                let actual = response.status.to_string();
                verdict(
                    op.matches(&actual, &value.to_string()),
                    ErrorCode::STATUS_ASSERT_FAILED,
                    format!("status code {} {} {}", actual, op.label(), value),
                )
            }
            AssertCheck::Body { op, value } => verdict(
                op.matches(&response.body_text(), value),
                ErrorCode::BODY_ASSERT_FAILED,
                format!("response body {} '{}'", op.label(), value),
            ),
            AssertCheck::BodyRegex { pattern } => match Regex::new(pattern) {
                Ok(regex) => verdict(
                    regex.is_match(&response.body_text()),
                    ErrorCode::BODY_ASSERT_FAILED,
                    format!("response body matches /{}/", pattern),
                ),
                Err(err) => AssertionResult::failed(
                    ErrorCode::INVALID_ASSERTION,
                    format!("invalid pattern '{}': {}", pattern, err),
                ),
            },
            AssertCheck::Header { name, op, value } => match response.header(name) {
                Some(actual) => verdict(
                    op.matches(actual, value),
                    ErrorCode::HEADER_ASSERT_FAILED,
                    format!("header '{}' value '{}' {} '{}'", name, actual, op.label(), value),
                ),
                None => AssertionResult::failed(
                    ErrorCode::HEADER_ASSERT_FAILED,
                    format!("header '{}' not found", name),
                ),
            },
            AssertCheck::Json { path, op, value } => {
                let document: Value = match serde_json::from_slice(&response.body) {
                    Ok(document) => document,
                    Err(err) => {
                        return AssertionResult::failed(
                            ErrorCode::JSON_ASSERT_FAILED,
                            format!("response body is not JSON: {}", err),
                        );
                    }
                };
                match lookup(&document, path) {
                    Some(found) => {
                        let actual = value_text(found);
                        let expected = value_text(value);
                        verdict(
                            op.matches(&actual, &expected),
                            ErrorCode::JSON_ASSERT_FAILED,
                            format!("{} = '{}' {} '{}'", path, actual, op.label(), expected),
                        )
                    }
                    None => AssertionResult::failed(
                        ErrorCode::JSON_ASSERT_FAILED,
                        format!("json path '{}' not found", path),
                    ),
                }
            }
        }
    }
}

impl AssertionRule for AssertRule {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn check(&self, response: &ResponseRecord) -> AssertionResult {
        self.check.run(response)
    }
}
