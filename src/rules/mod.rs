//! Extraction and assertion rules evaluated against a recorded response.
//!
//! The pipeline only talks to the [`ExtractionRule`] and [`AssertionRule`]
//! traits. [`ExtractRule`] and [`AssertRule`] are the rule kinds that can be
//! declared in configuration.
mod assert;
mod extract;
mod json_path;


use serde_json::Value;

use crate::http::ResponseRecord;
use crate::model::AssertionResult;
use crate::vars::VariableStore;

pub use assert::{AssertCheck, AssertRule, Compare};
pub use extract::{ExtractRule, ExtractSource};
pub use json_path::lookup as json_lookup;

/// Reads one value out of a response.
pub trait ExtractionRule {
    fn enabled(&self) -> bool;

    /// Name the value is stored under.
    fn variable(&self) -> &str;

    /// Returns `None` when nothing matched. Implementations may write into
    /// `store` themselves; that is how later requests observe the value.
    fn extract(&self, response: &ResponseRecord, store: &VariableStore) -> Option<Value>;
}

/// Validates one property of a response.
pub trait AssertionRule {
    fn enabled(&self) -> bool;

    fn check(&self, response: &ResponseRecord) -> AssertionResult;
}
