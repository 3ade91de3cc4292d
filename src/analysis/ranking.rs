//! Top-N views over execution times and recency.

use std::cmp::Ordering;

use crate::record::TestExecutionRecord;

/// The `n` slowest records, slowest first. Ties break by ascending id.
pub fn top_slowest(records: &[TestExecutionRecord], n: usize) -> Vec<&TestExecutionRecord> {
    let mut refs: Vec<&TestExecutionRecord> = records.iter().collect();
    refs.sort_by(|a, b| {
        b.execution_time_seconds
            .total_cmp(&a.execution_time_seconds)
            .then(a.id.cmp(&b.id))
    });
    refs.truncate(n);
    refs
}

/// The `n` fastest records, fastest first. Ties break by ascending id.
pub fn top_fastest(records: &[TestExecutionRecord], n: usize) -> Vec<&TestExecutionRecord> {
    let mut refs: Vec<&TestExecutionRecord> = records.iter().collect();
    refs.sort_by(|a, b| {
        a.execution_time_seconds
            .total_cmp(&b.execution_time_seconds)
            .then(a.id.cmp(&b.id))
    });
    refs.truncate(n);
    refs
}

/// The `n` most recent records, returned in chronological order so they
/// chart left-to-right. Records without a timestamp are not recent.
pub fn last_n_chronological(records: &[TestExecutionRecord], n: usize) -> Vec<&TestExecutionRecord> {
    let mut refs: Vec<&TestExecutionRecord> = records
        .iter()
        .filter(|r| r.timestamp.is_some())
        .collect();
    refs.sort_by(|a, b| match (b.timestamp, a.timestamp) {
        (Some(x), Some(y)) => x.cmp(&y).then(a.id.cmp(&b.id)),
        _ => Ordering::Equal,
    });
    refs.truncate(n);
    refs.reverse();
    refs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TestStatus;
    use chrono::{DateTime, Utc};

    fn record(id: i64, secs: f64, when: Option<&str>) -> TestExecutionRecord {
        TestExecutionRecord {
            id,
            test_name: format!("test_{id}"),
            status: TestStatus::Pass,
            execution_time_seconds: secs,
            timestamp: when.map(|s| {
                DateTime::parse_from_rfc3339(s)
                    .unwrap()
                    .with_timezone(&Utc)
            }),
            suite_id: None,
            steps: vec![],
        }
    }

    #[test]
    fn slowest_and_fastest() {
        let records = vec![
            record(1, 4.0, None),
            record(2, 9.0, None),
            record(3, 1.0, None),
        ];
        let slowest: Vec<i64> = top_slowest(&records, 2).iter().map(|r| r.id).collect();
        assert_eq!(slowest, vec![2, 1]);

        let fastest: Vec<i64> = top_fastest(&records, 2).iter().map(|r| r.id).collect();
        assert_eq!(fastest, vec![3, 1]);
    }

    #[test]
    fn ties_break_by_id() {
        let records = vec![record(7, 2.0, None), record(3, 2.0, None)];
        let slowest: Vec<i64> = top_slowest(&records, 2).iter().map(|r| r.id).collect();
        assert_eq!(slowest, vec![3, 7]);
    }

    #[test]
    fn last_n_is_chronological() {
        let records = vec![
            record(1, 1.0, Some("2025-03-01T08:00:00Z")),
            record(2, 1.0, Some("2025-03-03T08:00:00Z")),
            record(3, 1.0, Some("2025-03-02T08:00:00Z")),
            record(4, 1.0, None),
        ];
        let ids: Vec<i64> = last_n_chronological(&records, 2).iter().map(|r| r.id).collect();
        // The two most recent (ids 2 and 3), oldest first.
        assert_eq!(ids, vec![3, 2]);
    }
}
