//! Summary counts and rates over a record collection.

use serde::Serialize;

use crate::record::{TestExecutionRecord, TestStatus};

/// Pass/fail counts, pass rate, and mean execution time for one scope.
///
/// `pass_rate` is a percentage kept at full precision; rounding is the
/// presenter's job. An empty collection yields all zeros, never NaN.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSummary {
    pub total_tests: u64,
    pub passed_tests: u64,
    pub failed_tests: u64,
    pub pass_rate: f64,
    pub avg_execution_time: f64,
}

impl AggregateSummary {
    pub fn empty() -> Self {
        Self {
            total_tests: 0,
            passed_tests: 0,
            failed_tests: 0,
            pass_rate: 0.0,
            avg_execution_time: 0.0,
        }
    }
}

/// Reduce a record collection to its summary. Pure, O(n), no side effects.
/// Failed runs count toward the execution-time average too.
pub fn aggregate(records: &[TestExecutionRecord]) -> AggregateSummary {
    if records.is_empty() {
        return AggregateSummary::empty();
    }

    let total = records.len() as u64;
    let passed = records
        .iter()
        .filter(|r| r.status == TestStatus::Pass)
        .count() as u64;
    let time_sum: f64 = records.iter().map(|r| r.execution_time_seconds).sum();

    AggregateSummary {
        total_tests: total,
        passed_tests: passed,
        failed_tests: total - passed,
        pass_rate: passed as f64 / total as f64 * 100.0,
        avg_execution_time: time_sum / total as f64,
    }
}
