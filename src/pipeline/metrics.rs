use std::time::Duration;

use crate::http::{ExecutionFacts, ResponseRecord};

const BYTES_PER_KIB: f64 = 1024.0;

/// Traffic facts of one exchange.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrafficMetrics {
    pub elapsed: Duration,
    pub bytes_sent: u64,
    pub bytes_received_kib: f64,
}

impl TrafficMetrics {
    /// Elapsed time and bytes sent come from the executor unchanged.
    #[must_use]
    pub fn compute(response: &ResponseRecord, facts: &ExecutionFacts) -> Self {
        Self {
            elapsed: facts.elapsed,
            bytes_sent: facts.bytes_sent,
            bytes_received_kib: received_kib(response),
        }
    }
}

/// Declared `Content-Length` in KiB, or the received body length when the
/// declared value is missing or not positive.
#[must_use]
#[expect(clippy::float_arithmetic, reason = "KiB is reported as a fraction")]
pub fn received_kib(response: &ResponseRecord) -> f64 {
    let declared = response.content_length as f64 / BYTES_PER_KIB;
    if declared > 0.0 {
        declared
    } else {
        response.body.len() as f64 / BYTES_PER_KIB
    }
}
