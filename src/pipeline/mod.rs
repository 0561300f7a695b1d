//! The single-request pipeline and its stages.
mod assertions;
mod coordinator;
mod extract;
mod metrics;
mod trace;

#[cfg(test)]
mod tests;

pub use assertions::{AssertionSummary, evaluate_assertions};
pub use coordinator::Pipeline;
pub use extract::{ExtractedVar, extract_variables};
pub use metrics::{TrafficMetrics, received_kib};
pub use trace::{DebugTrace, TraceInput, TraceStatus, build_trace, should_capture};
