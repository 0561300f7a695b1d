use crate::http::ResponseRecord;
use crate::model::{AssertionResult, ErrorCode};
use crate::rules::AssertionRule;

/// Aggregated verdict of all enabled assertion rules.
///
/// `code` and `message` describe the last failing rule in evaluation order;
/// `results` keeps every rule's own verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionSummary {
    pub success: bool,
    pub code: ErrorCode,
    pub message: String,
    pub results: Vec<AssertionResult>,
    pub evaluated: usize,
    pub failed: usize,
}

impl Default for AssertionSummary {
    fn default() -> Self {
        Self {
            success: true,
            code: ErrorCode::NO_ERROR,
            message: String::new(),
            results: Vec::new(),
            evaluated: 0,
            failed: 0,
        }
    }
}

pub fn evaluate_assertions<R>(response: &ResponseRecord, rules: &[R]) -> AssertionSummary
where
    R: AssertionRule,
{
    let mut summary = AssertionSummary::default();
    for rule in rules.iter().filter(|rule| rule.enabled()) {
        let result = rule.check(response);
        if !result.success {
            summary.success = false;
            summary.code = result.code;
            summary.message.clone_from(&result.message);
            summary.failed = summary.failed.saturating_add(1);
        }
        summary.results.push(result);
        summary.evaluated = summary.evaluated.saturating_add(1);
    }
    summary
}
