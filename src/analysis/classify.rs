//! Heuristic classification of free-text failure messages.
//!
//! The rules are deliberately shallow: collapse messages that differ only in
//! trailing metadata onto one short, stable label. Downstream displays key
//! off the exact labels produced here, so the rules must not drift.

use serde::Serialize;

use crate::record::TestExecutionRecord;

/// Label used when a failing step exists but carries no message.
pub const UNKNOWN_ERROR_TYPE: &str = "Unknown";

/// Map a raw failure message to its classification label.
///
/// An empty label means the message is suppressed (component listings are
/// framework noise, not failures); callers must treat it as "nothing to
/// display", not as an error.
pub fn classify_error(message: &str) -> String {
    if message.is_empty() {
        return "Unknown Error".to_string();
    }
    if message.contains("Components used:") {
        return String::new();
    }

    let msg = match message.get(..8) {
        Some(prefix) if prefix.eq_ignore_ascii_case("message:") => message[8..].trim(),
        _ => message,
    };

    if msg.to_lowercase().contains("element click intercepted") {
        return "element click intercepted".to_string();
    }

    // First three whitespace-separated tokens, enough to merge duplicates.
    msg.split_whitespace().take(3).collect::<Vec<_>>().join(" ")
}

/// Classification for one record: the first non-pass step in execution
/// order decides, or "Unknown" when there is none or it has no message.
///
/// The scan runs regardless of the record's stored status; a record stored
/// as PASS with a failing step still classifies from that step.
pub fn record_error_type(record: &TestExecutionRecord) -> String {
    let failing = record
        .steps_in_order()
        .into_iter()
        .find(|s| !s.status.is_pass());

    match failing
        .and_then(|s| s.error_message.as_deref())
        .filter(|m| !m.is_empty())
    {
        Some(message) => classify_error(message),
        None => UNKNOWN_ERROR_TYPE.to_string(),
    }
}

/// One classification label with its occurrence count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBucket {
    pub label: String,
    pub count: u64,
}

/// Count classification labels across every non-pass step of a record set.
/// Suppressed (empty) labels are skipped; a missing message counts under
/// "Unknown Error". Buckets appear in first-seen order.
pub fn error_distribution(records: &[TestExecutionRecord]) -> Vec<ErrorBucket> {
    let mut buckets: Vec<ErrorBucket> = Vec::new();
    for record in records {
        for step in &record.steps {
            if step.status.is_pass() {
                continue;
            }
            let label = classify_error(step.error_message.as_deref().unwrap_or(""));
            if label.is_empty() {
                continue;
            }
            match buckets.iter_mut().find(|b| b.label == label) {
                Some(bucket) => bucket.count += 1,
                None => buckets.push(ErrorBucket { label, count: 1 }),
            }
        }
    }
    buckets
}
