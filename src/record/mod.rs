//! Domain model for test-execution records, steps, and suites.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("unrecognized test status '{0}' (expected PASS or FAIL)")]
    InvalidStatus(String),
}

/// Terminal status of a completed test run.
///
/// Parsed case-insensitively on ingestion, rendered uppercase everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TestStatus {
    Pass,
    Fail,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Pass => "PASS",
            TestStatus::Fail => "FAIL",
        }
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TestStatus {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("pass") {
            Ok(TestStatus::Pass)
        } else if s.eq_ignore_ascii_case("fail") {
            Ok(TestStatus::Fail)
        } else {
            Err(RecordError::InvalidStatus(s.to_string()))
        }
    }
}

impl TryFrom<String> for TestStatus {
    type Error = RecordError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TestStatus> for String {
    fn from(s: TestStatus) -> String {
        s.as_str().to_string()
    }
}

/// Status of a single step. Anything that is not PASS/FAIL round-trips
/// verbatim through `Other` (the execution pipeline emits e.g. ERROR, SKIP).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepStatus {
    Pass,
    Fail,
    Other(String),
}

impl StepStatus {
    pub fn is_pass(&self) -> bool {
        matches!(self, StepStatus::Pass)
    }

    pub fn as_str(&self) -> &str {
        match self {
            StepStatus::Pass => "PASS",
            StepStatus::Fail => "FAIL",
            StepStatus::Other(s) => s,
        }
    }
}

impl From<String> for StepStatus {
    fn from(s: String) -> Self {
        if s.eq_ignore_ascii_case("pass") {
            StepStatus::Pass
        } else if s.eq_ignore_ascii_case("fail") {
            StepStatus::Fail
        } else {
            StepStatus::Other(s)
        }
    }
}

impl From<StepStatus> for String {
    fn from(s: StepStatus) -> String {
        s.as_str().to_string()
    }
}

/// One step inside a test run. `step_number` defines execution order;
/// the array order of `TestExecutionRecord::steps` carries no meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestStep {
    pub step_number: u32,
    pub description: String,
    pub status: StepStatus,
    pub error_message: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// One completed test execution. Immutable once ingested; every view in
/// `analysis` derives from it without mutation.
///
/// `timestamp` is `None` when the stored value could not be parsed. Such
/// records are skipped by time-based trend series and date facets but still
/// counted by the aggregate calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestExecutionRecord {
    pub id: i64,
    pub test_name: String,
    pub status: TestStatus,
    pub execution_time_seconds: f64,
    pub timestamp: Option<DateTime<Utc>>,
    pub suite_id: Option<i64>,
    #[serde(default)]
    pub steps: Vec<TestStep>,
}

impl TestExecutionRecord {
    /// Steps in execution order (sorted by `step_number`).
    pub fn steps_in_order(&self) -> Vec<&TestStep> {
        let mut steps: Vec<&TestStep> = self.steps.iter().collect();
        steps.sort_by_key(|s| s.step_number);
        steps
    }

    /// When steps exist, the run started at the earliest step timestamp;
    /// otherwise at the record's own timestamp.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.steps
            .iter()
            .filter_map(|s| s.timestamp)
            .min()
            .or(self.timestamp)
    }

    /// Status as recomputed from steps: FAIL if any step is non-pass.
    ///
    /// Diagnostic only. The stored `status` is authoritative for all counts,
    /// and the two may disagree.
    pub fn derived_status(&self) -> Option<TestStatus> {
        if self.steps.is_empty() {
            return None;
        }
        if self.steps.iter().any(|s| !s.status.is_pass()) {
            Some(TestStatus::Fail)
        } else {
            Some(TestStatus::Pass)
        }
    }
}

/// Named grouping of records. A record's `suite_id` is a weak reference:
/// deleting a suite orphans its records, it never deletes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSuite {
    pub id: i64,
    pub name: String,
    pub project_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_status_parses_case_insensitively() {
        assert_eq!("pass".parse::<TestStatus>().unwrap(), TestStatus::Pass);
        assert_eq!("FAIL".parse::<TestStatus>().unwrap(), TestStatus::Fail);
        assert_eq!("Pass".parse::<TestStatus>().unwrap(), TestStatus::Pass);
        assert!("flaky".parse::<TestStatus>().is_err());
    }

    #[test]
    fn test_status_renders_uppercase() {
        assert_eq!(TestStatus::Pass.to_string(), "PASS");
        assert_eq!(TestStatus::Fail.to_string(), "FAIL");
    }

    #[test]
    fn step_status_keeps_unknown_values() {
        let s = StepStatus::from("ERROR".to_string());
        assert_eq!(s, StepStatus::Other("ERROR".to_string()));
        assert_eq!(s.as_str(), "ERROR");
        assert!(!s.is_pass());
        assert!(StepStatus::from("pass".to_string()).is_pass());
    }

    #[test]
    fn started_at_uses_min_step_timestamp() {
        let record = TestExecutionRecord {
            id: 1,
            test_name: "login".into(),
            status: TestStatus::Pass,
            execution_time_seconds: 3.0,
            timestamp: Some(ts("2025-03-01T12:00:00Z")),
            suite_id: None,
            steps: vec![
                TestStep {
                    step_number: 2,
                    description: "submit".into(),
                    status: StepStatus::Pass,
                    error_message: None,
                    timestamp: Some(ts("2025-03-01T11:59:58Z")),
                },
                TestStep {
                    step_number: 1,
                    description: "open page".into(),
                    status: StepStatus::Pass,
                    error_message: None,
                    timestamp: Some(ts("2025-03-01T11:59:55Z")),
                },
            ],
        };
        assert_eq!(record.started_at(), Some(ts("2025-03-01T11:59:55Z")));
        // Execution order follows step_number, not array order.
        let ordered = record.steps_in_order();
        assert_eq!(ordered[0].step_number, 1);
        assert_eq!(ordered[1].step_number, 2);
    }

    #[test]
    fn started_at_falls_back_to_record_timestamp() {
        let when = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let record = TestExecutionRecord {
            id: 2,
            test_name: "checkout".into(),
            status: TestStatus::Fail,
            execution_time_seconds: 1.5,
            timestamp: Some(when),
            suite_id: None,
            steps: vec![],
        };
        assert_eq!(record.started_at(), Some(when));
    }

    #[test]
    fn derived_status_can_disagree_with_stored_status() {
        // Stored PASS with a failing step: stored status stays authoritative
        // for counts, the derivation is diagnostic only.
        let record = TestExecutionRecord {
            id: 3,
            test_name: "search".into(),
            status: TestStatus::Pass,
            execution_time_seconds: 0.4,
            timestamp: None,
            suite_id: None,
            steps: vec![TestStep {
                step_number: 1,
                description: "query".into(),
                status: StepStatus::Fail,
                error_message: Some("timeout".into()),
                timestamp: None,
            }],
        };
        assert_eq!(record.status, TestStatus::Pass);
        assert_eq!(record.derived_status(), Some(TestStatus::Fail));
    }
}
