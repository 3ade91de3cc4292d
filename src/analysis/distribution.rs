//! Grouping of records by suite for categorical display.

use std::collections::HashMap;

use serde::Serialize;

use crate::analysis::aggregate::aggregate;
use crate::record::{TestExecutionRecord, TestSuite};

/// Bucket label for records with no suite assignment.
pub const NO_SUITE_LABEL: &str = "no suite";

/// One categorical slice: a suite label and how many records fall under it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuiteSlice {
    pub suite_label: String,
    pub count: u64,
}

/// Group records by suite. Unassigned records land in the "no suite"
/// bucket; an id whose suite row no longer exists keeps its own bucket,
/// labeled by id. Buckets appear in first-seen order; consumers treat the
/// result as categorical data, no ordering is promised beyond stability.
pub fn suite_distribution(
    records: &[TestExecutionRecord],
    suites: &[TestSuite],
) -> Vec<SuiteSlice> {
    let names: HashMap<i64, &str> = suites.iter().map(|s| (s.id, s.name.as_str())).collect();

    let mut slices: Vec<SuiteSlice> = Vec::new();
    for record in records {
        let label = match record.suite_id {
            None => NO_SUITE_LABEL.to_string(),
            Some(id) => match names.get(&id) {
                Some(name) => (*name).to_string(),
                None => format!("suite {id}"),
            },
        };
        match slices.iter_mut().find(|s| s.suite_label == label) {
            Some(slice) => slice.count += 1,
            None => slices.push(SuiteSlice { suite_label: label, count: 1 }),
        }
    }
    slices
}

/// Full summary for one suite's records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuiteBreakdown {
    pub suite_name: String,
    pub total_tests: u64,
    pub passed_tests: u64,
    pub failed_tests: u64,
    pub pass_rate: f64,
    pub avg_execution_time: f64,
}

/// Aggregate per suite, one breakdown per suite that has records in the
/// input. Unassigned records are not part of any breakdown; suites follow
/// their input order.
pub fn aggregate_by_suite(
    records: &[TestExecutionRecord],
    suites: &[TestSuite],
) -> Vec<SuiteBreakdown> {
    suites
        .iter()
        .filter_map(|suite| {
            let members: Vec<TestExecutionRecord> = records
                .iter()
                .filter(|r| r.suite_id == Some(suite.id))
                .cloned()
                .collect();
            if members.is_empty() {
                return None;
            }
            let summary = aggregate(&members);
            Some(SuiteBreakdown {
                suite_name: suite.name.clone(),
                total_tests: summary.total_tests,
                passed_tests: summary.passed_tests,
                failed_tests: summary.failed_tests,
                pass_rate: summary.pass_rate,
                avg_execution_time: summary.avg_execution_time,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TestStatus;

    fn record(id: i64, suite_id: Option<i64>, status: TestStatus, secs: f64) -> TestExecutionRecord {
        TestExecutionRecord {
            id,
            test_name: format!("test_{id}"),
            status,
            execution_time_seconds: secs,
            timestamp: None,
            suite_id,
            steps: vec![],
        }
    }

    fn suite(id: i64, name: &str) -> TestSuite {
        TestSuite {
            id,
            name: name.to_string(),
            project_id: Some(1),
            created_at: None,
        }
    }

    #[test]
    fn distribution_groups_by_suite_with_sentinel() {
        let suites = vec![suite(1, "smoke"), suite(2, "regression")];
        let records = vec![
            record(1, Some(1), TestStatus::Pass, 1.0),
            record(2, None, TestStatus::Fail, 1.0),
            record(3, Some(1), TestStatus::Pass, 1.0),
            record(4, Some(2), TestStatus::Pass, 1.0),
        ];
        let slices = suite_distribution(&records, &suites);
        assert_eq!(
            slices,
            vec![
                SuiteSlice { suite_label: "smoke".into(), count: 2 },
                SuiteSlice { suite_label: NO_SUITE_LABEL.into(), count: 1 },
                SuiteSlice { suite_label: "regression".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn orphaned_suite_id_keeps_its_own_bucket() {
        let records = vec![record(1, Some(42), TestStatus::Pass, 1.0)];
        let slices = suite_distribution(&records, &[]);
        assert_eq!(slices[0].suite_label, "suite 42");
    }

    #[test]
    fn empty_input_yields_no_slices() {
        assert!(suite_distribution(&[], &[suite(1, "smoke")]).is_empty());
        assert!(aggregate_by_suite(&[], &[suite(1, "smoke")]).is_empty());
    }

    #[test]
    fn breakdown_aggregates_per_suite() {
        let suites = vec![suite(1, "smoke"), suite(2, "regression"), suite(3, "empty")];
        let records = vec![
            record(1, Some(1), TestStatus::Pass, 2.0),
            record(2, Some(1), TestStatus::Fail, 4.0),
            record(3, Some(2), TestStatus::Pass, 1.0),
            record(4, None, TestStatus::Pass, 9.0),
        ];
        let breakdowns = aggregate_by_suite(&records, &suites);
        assert_eq!(breakdowns.len(), 2);

        assert_eq!(breakdowns[0].suite_name, "smoke");
        assert_eq!(breakdowns[0].total_tests, 2);
        assert_eq!(breakdowns[0].passed_tests, 1);
        assert!((breakdowns[0].pass_rate - 50.0).abs() < 1e-9);
        assert!((breakdowns[0].avg_execution_time - 3.0).abs() < 1e-9);

        // Suites without records produce no breakdown; unassigned records
        // belong to none.
        assert_eq!(breakdowns[1].suite_name, "regression");
        assert_eq!(breakdowns[1].total_tests, 1);
    }
}
