//! testtriage -- decision-ready analytics for test-execution records.
//!
//! This crate turns a stream of raw test-execution records into the views a
//! reporting surface consumes: multi-facet filtered and sorted record
//! lists, pass/fail aggregates, time-bucketed trend series, suite
//! distributions, and a heuristic classification of failure causes from
//! free-text error messages.

pub mod analysis;
pub mod filter;
pub mod record;
pub mod store;

use anyhow::Result;

use crate::filter::{filter_and_sort, FilterParams, SortKey};
use crate::record::TestExecutionRecord;
use crate::store::{RecordStore, Scope};

/// Fetch a scope's records and apply a validated filter and sort.
///
/// This is the entry point of one aggregation pass: the returned collection
/// is a stable snapshot, and every derivation in [`analysis`] can consume
/// it independently.
pub async fn scoped_records(
    store: &dyn RecordStore,
    scope: &Scope,
    params: &FilterParams,
    sort: SortKey,
) -> Result<Vec<TestExecutionRecord>> {
    // Validate the filter before touching the store: a malformed bound must
    // never yield partial results.
    let spec = params.parse()?;
    let records = store.fetch_records(scope).await?;
    Ok(filter_and_sort(records, &spec, sort))
}
