//! Multi-facet filtering and sorting of record collections.
//!
//! Filtering and sorting are independent and composable: filtering only
//! removes non-matching records, sorting only reorders. Raw (string) bound
//! values are validated up front by [`FilterParams::parse`]; a malformed
//! bound is an error, never a silently dropped facet.

use std::cmp::Ordering;

use chrono::NaiveDate;
use thiserror::Error;

use crate::record::{TestExecutionRecord, TestStatus};

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid {field} '{value}': expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },
    #[error("invalid {field} '{value}': expected a number")]
    InvalidNumber { field: &'static str, value: String },
    #[error("invalid status filter '{0}' (expected PASS or FAIL)")]
    InvalidStatus(String),
    #[error("unknown sort key '{0}'")]
    InvalidSortKey(String),
}

/// Raw filter bounds as received from a caller (query string, CLI flags).
/// Absent fields mean "facet not applied"; present fields must validate.
#[derive(Debug, Default, Clone)]
pub struct FilterParams {
    pub status: Option<String>,
    pub test_name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub min_execution_time: Option<String>,
    pub max_execution_time: Option<String>,
    pub suite_id: Option<i64>,
}

impl FilterParams {
    /// Validate every supplied bound into a typed [`FilterSpec`].
    pub fn parse(&self) -> Result<FilterSpec, FilterError> {
        let status = match &self.status {
            Some(raw) => Some(
                raw.parse::<TestStatus>()
                    .map_err(|_| FilterError::InvalidStatus(raw.clone()))?,
            ),
            None => None,
        };

        Ok(FilterSpec {
            status,
            test_name: self.test_name.clone(),
            start_date: parse_date("start date", self.start_date.as_deref())?,
            end_date: parse_date("end date", self.end_date.as_deref())?,
            min_execution_time: parse_number(
                "minimum execution time",
                self.min_execution_time.as_deref(),
            )?,
            max_execution_time: parse_number(
                "maximum execution time",
                self.max_execution_time.as_deref(),
            )?,
            suite_id: self.suite_id,
        })
    }
}

fn parse_date(field: &'static str, raw: Option<&str>) -> Result<Option<NaiveDate>, FilterError> {
    match raw {
        None => Ok(None),
        Some(value) => value
            .parse::<NaiveDate>()
            .map(Some)
            .map_err(|_| FilterError::InvalidDate {
                field,
                value: value.to_string(),
            }),
    }
}

fn parse_number(field: &'static str, raw: Option<&str>) -> Result<Option<f64>, FilterError> {
    match raw {
        None => Ok(None),
        Some(value) => value
            .parse::<f64>()
            .map(Some)
            .map_err(|_| FilterError::InvalidNumber {
                field,
                value: value.to_string(),
            }),
    }
}

/// Validated filter specification. All supplied facets apply simultaneously
/// (logical AND); unsupplied facets are unbounded.
#[derive(Debug, Default, Clone)]
pub struct FilterSpec {
    pub status: Option<TestStatus>,
    /// Case-insensitive substring match on the test name.
    pub test_name: Option<String>,
    /// Inclusive calendar-day bounds on the record timestamp.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Inclusive bounds on execution time in seconds.
    pub min_execution_time: Option<f64>,
    pub max_execution_time: Option<f64>,
    pub suite_id: Option<i64>,
}

impl FilterSpec {
    pub fn matches(&self, record: &TestExecutionRecord) -> bool {
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(needle) = &self.test_name {
            if !record
                .test_name
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        if self.start_date.is_some() || self.end_date.is_some() {
            // Date facets require a parseable timestamp.
            let Some(ts) = record.timestamp else {
                return false;
            };
            let day = ts.date_naive();
            if let Some(start) = self.start_date {
                if day < start {
                    return false;
                }
            }
            if let Some(end) = self.end_date {
                if day > end {
                    return false;
                }
            }
        }
        if let Some(min) = self.min_execution_time {
            if record.execution_time_seconds < min {
                return false;
            }
        }
        if let Some(max) = self.max_execution_time {
            if record.execution_time_seconds > max {
                return false;
            }
        }
        if let Some(suite_id) = self.suite_id {
            if record.suite_id != Some(suite_id) {
                return false;
            }
        }
        true
    }
}

/// Orderings for a record collection. Ties break by ascending id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Id,
    TestName,
    ExecutionTime,
    MostRecentExecution,
}

impl std::str::FromStr for SortKey {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "id" => Ok(SortKey::Id),
            "test_name" => Ok(SortKey::TestName),
            "execution_time" => Ok(SortKey::ExecutionTime),
            "most_recent" => Ok(SortKey::MostRecentExecution),
            _ => Err(FilterError::InvalidSortKey(s.to_string())),
        }
    }
}

/// Keep only records matching every supplied facet, preserving input order.
pub fn filter_records(
    records: Vec<TestExecutionRecord>,
    spec: &FilterSpec,
) -> Vec<TestExecutionRecord> {
    records.into_iter().filter(|r| spec.matches(r)).collect()
}

/// Order records by the chosen key, ties by ascending id.
pub fn sort_records(records: &mut [TestExecutionRecord], key: SortKey) {
    match key {
        SortKey::Id => records.sort_by_key(|r| r.id),
        SortKey::TestName => {
            records.sort_by(|a, b| a.test_name.cmp(&b.test_name).then(a.id.cmp(&b.id)));
        }
        SortKey::ExecutionTime => records.sort_by(|a, b| {
            a.execution_time_seconds
                .total_cmp(&b.execution_time_seconds)
                .then(a.id.cmp(&b.id))
        }),
        SortKey::MostRecentExecution => records.sort_by(|a, b| match (a.timestamp, b.timestamp) {
            // Most recent first; records without a timestamp sort last.
            (Some(x), Some(y)) => y.cmp(&x).then(a.id.cmp(&b.id)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.id.cmp(&b.id),
        }),
    }
}

/// Filter then sort in one pass over an owned collection.
pub fn filter_and_sort(
    records: Vec<TestExecutionRecord>,
    spec: &FilterSpec,
    key: SortKey,
) -> Vec<TestExecutionRecord> {
    let mut out = filter_records(records, spec);
    sort_records(&mut out, key);
    out
}
