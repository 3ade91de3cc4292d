//! Time-bucketed trend series over a record collection.
//!
//! Every series is recomputed fresh from the records it is given; nothing is
//! cached across filter changes. Only records with a parseable timestamp
//! participate. Per-day and per-week series are sparse: buckets with zero
//! records are omitted, not zero-filled, and consumers render only the
//! points that are emitted.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::record::{TestExecutionRecord, TestStatus};

/// Which derived series to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Pass rate over the first i records, one point per record.
    CumulativePassRate,
    /// Mean execution time over the first i records, one point per record.
    RollingAvgExecutionTime,
    /// Running record count, one point per record.
    CumulativeCount,
    /// Records per calendar day.
    TestsPerDay,
    /// Records per ISO week, labeled by the week's Monday.
    TestsPerWeek,
}

impl std::str::FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "pass_rate" => Ok(MetricKind::CumulativePassRate),
            "avg_exec_time" => Ok(MetricKind::RollingAvgExecutionTime),
            "test_count" => Ok(MetricKind::CumulativeCount),
            "per_day" => Ok(MetricKind::TestsPerDay),
            "per_week" => Ok(MetricKind::TestsPerWeek),
            _ => Err(format!(
                "unknown trend metric '{s}' (expected pass-rate, avg-exec-time, test-count, per-day or per-week)"
            )),
        }
    }
}

/// One point of a trend series. Labels are calendar days (`YYYY-MM-DD`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub label: String,
    pub value: f64,
}

/// Build the requested series from a record collection.
///
/// Records are ordered ascending by timestamp internally (stable, so equal
/// timestamps keep their input order); records without a valid timestamp are
/// skipped. An empty input produces an empty series, never an error.
pub fn build_trend(records: &[TestExecutionRecord], kind: MetricKind) -> Vec<TrendPoint> {
    let mut timed: Vec<(&TestExecutionRecord, DateTime<Utc>)> = records
        .iter()
        .filter_map(|r| r.timestamp.map(|ts| (r, ts)))
        .collect();
    timed.sort_by_key(|(_, ts)| *ts);

    match kind {
        MetricKind::CumulativePassRate => {
            let mut passed = 0u64;
            timed
                .iter()
                .enumerate()
                .map(|(i, (record, ts))| {
                    if record.status == TestStatus::Pass {
                        passed += 1;
                    }
                    TrendPoint {
                        label: day_label(*ts),
                        value: passed as f64 / (i + 1) as f64 * 100.0,
                    }
                })
                .collect()
        }
        MetricKind::RollingAvgExecutionTime => {
            let mut time_sum = 0.0f64;
            timed
                .iter()
                .enumerate()
                .map(|(i, (record, ts))| {
                    time_sum += record.execution_time_seconds;
                    TrendPoint {
                        label: day_label(*ts),
                        value: time_sum / (i + 1) as f64,
                    }
                })
                .collect()
        }
        MetricKind::CumulativeCount => timed
            .iter()
            .enumerate()
            .map(|(i, (_, ts))| TrendPoint {
                label: day_label(*ts),
                value: (i + 1) as f64,
            })
            .collect(),
        MetricKind::TestsPerDay => {
            bucketed(&timed, |day| day)
        }
        MetricKind::TestsPerWeek => {
            // ISO weeks start on Monday; the bucket is labeled by that Monday.
            bucketed(&timed, |day| {
                day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
            })
        }
    }
}

fn day_label(ts: DateTime<Utc>) -> String {
    ts.date_naive().to_string()
}

fn bucketed(
    timed: &[(&TestExecutionRecord, DateTime<Utc>)],
    bucket_of: impl Fn(NaiveDate) -> NaiveDate,
) -> Vec<TrendPoint> {
    let mut buckets: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for (_, ts) in timed {
        *buckets.entry(bucket_of(ts.date_naive())).or_insert(0) += 1;
    }
    buckets
        .into_iter()
        .map(|(day, count)| TrendPoint {
            label: day.to_string(),
            value: count as f64,
        })
        .collect()
}
