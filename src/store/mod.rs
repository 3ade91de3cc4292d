//! SQLite-backed record store -- pool setup, scope queries, ingestion.
//!
//! The analytics core only needs one thing from a store: a stable snapshot
//! of the records matching a scope ([`RecordStore::fetch_records`]). The
//! SQLite implementation here is the shipped accessor; everything derived
//! from its output lives in [`crate::analysis`] and never touches the
//! database.

pub mod schema;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use r2d2::Pool as R2D2Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Value;
use serde::Deserialize;
use tracing::warn;

use crate::record::{StepStatus, TestExecutionRecord, TestStatus, TestStep, TestSuite};

/// Connection Pool type
pub type Pool = R2D2Pool<SqliteConnectionManager>;

/// Open (or create) the SQLite database and return a connection pool.
pub fn open_pool(path: &str) -> Result<Pool> {
    let manager = SqliteConnectionManager::file(path).with_init(|c| {
        c.execute_batch(
            "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
        )
    });

    let pool = R2D2Pool::new(manager)?;

    // Run migrations on a single connection
    let conn = pool.get()?;
    schema::migrate(&conn)?;

    Ok(pool)
}

/// Which records a caller wants: a project, optionally narrowed to one
/// suite and/or a calendar-day window.
#[derive(Debug, Clone)]
pub struct Scope {
    pub project_id: i64,
    pub suite_id: Option<i64>,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

impl Scope {
    pub fn new(project_id: i64) -> Self {
        Self {
            project_id,
            suite_id: None,
            date_range: None,
        }
    }
}

/// The external-collaborator seam: anything that can return all records
/// matching a scope. The core requires a stable snapshot per invocation
/// and nothing else.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch_records(&self, scope: &Scope) -> Result<Vec<TestExecutionRecord>>;
}

/// A record as submitted by the test-execution pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordSubmission {
    pub test_name: String,
    pub status: TestStatus,
    pub execution_time: f64,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub suite_id: Option<i64>,
    #[serde(default)]
    pub suite_name: Option<String>,
    #[serde(default)]
    pub steps: Vec<StepSubmission>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StepSubmission {
    pub step_number: u32,
    pub description: String,
    pub status: StepStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool,
}

impl SqliteStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn open(path: &str) -> Result<Self> {
        Ok(Self::new(open_pool(path)?))
    }

    /// Store one submitted record with its steps. A `suite_name` is matched
    /// case-insensitively against existing suites (stored lowercase) and
    /// created on first use. Returns the new record id.
    pub fn insert_record(&self, project_id: i64, submission: &RecordSubmission) -> Result<i64> {
        let conn = self.pool.get()?;

        let suite_id = match &submission.suite_name {
            Some(name) => Some(resolve_suite(&conn, name, Some(project_id))?),
            None => submission.suite_id,
        };

        // Timestamps are stored as submitted; the read path decides what
        // parses. A missing timestamp defaults to now.
        let timestamp = submission
            .timestamp
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339());

        conn.execute(
            "INSERT INTO test_records (test_name, status, execution_time, timestamp, suite_id, project_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                submission.test_name,
                submission.status.as_str(),
                submission.execution_time,
                timestamp,
                suite_id,
                project_id,
            ],
        )
        .context("failed to insert test record")?;

        let record_id = conn.last_insert_rowid();

        let mut stmt = conn.prepare(
            "INSERT INTO test_steps (record_id, step_number, description, status, error_message, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for step in &submission.steps {
            stmt.execute(rusqlite::params![
                record_id,
                step.step_number,
                step.description,
                step.status.as_str(),
                step.error_message,
                step.timestamp,
            ])?;
        }

        Ok(record_id)
    }

    /// List suites, optionally only those of one project.
    pub fn list_suites(&self, project_id: Option<i64>) -> Result<Vec<TestSuite>> {
        let conn = self.pool.get()?;
        let (sql, params): (&str, Vec<Value>) = match project_id {
            Some(id) => (
                "SELECT id, name, project_id, created_at FROM test_suites WHERE project_id = ?1 ORDER BY id",
                vec![Value::Integer(id)],
            ),
            None => (
                "SELECT id, name, project_id, created_at FROM test_suites ORDER BY id",
                vec![],
            ),
        };

        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params), |row| {
            Ok(TestSuite {
                id: row.get(0)?,
                name: row.get(1)?,
                project_id: row.get(2)?,
                created_at: parse_timestamp(row.get::<_, Option<String>>(3)?.as_deref()),
            })
        })?;

        let mut suites = Vec::new();
        for r in rows {
            suites.push(r?);
        }
        Ok(suites)
    }

    /// Create a suite with the given name as-is. Fails if the name exists.
    pub fn create_suite(&self, name: &str, project_id: Option<i64>) -> Result<i64> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO test_suites (name, project_id) VALUES (?1, ?2)",
            rusqlite::params![name, project_id],
        )
        .with_context(|| format!("failed to create suite '{name}'"))?;
        Ok(conn.last_insert_rowid())
    }

    pub fn rename_suite(&self, suite_id: i64, new_name: &str) -> Result<()> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            "UPDATE test_suites SET name = ?1 WHERE id = ?2",
            rusqlite::params![new_name, suite_id],
        )?;
        anyhow::ensure!(changed == 1, "suite {suite_id} not found");
        Ok(())
    }

    /// Delete a suite. Its records survive with their reference nulled out.
    pub fn delete_suite(&self, suite_id: i64) -> Result<()> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            "DELETE FROM test_suites WHERE id = ?1",
            rusqlite::params![suite_id],
        )?;
        anyhow::ensure!(changed == 1, "suite {suite_id} not found");
        Ok(())
    }

    fn query_records(&self, scope: &Scope) -> Result<Vec<TestExecutionRecord>> {
        let conn = self.pool.get()?;

        let mut sql = String::from(
            "SELECT id, test_name, status, execution_time, timestamp, suite_id
             FROM test_records WHERE project_id = ?1",
        );
        let mut params: Vec<Value> = vec![Value::Integer(scope.project_id)];
        if let Some(suite_id) = scope.suite_id {
            params.push(Value::Integer(suite_id));
            sql.push_str(&format!(" AND suite_id = ?{}", params.len()));
        }
        if let Some((from, to)) = scope.date_range {
            params.push(Value::Text(from.to_string()));
            sql.push_str(&format!(" AND date(timestamp) >= ?{}", params.len()));
            params.push(Value::Text(to.to_string()));
            sql.push_str(&format!(" AND date(timestamp) <= ?{}", params.len()));
        }
        sql.push_str(" ORDER BY id ASC");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<i64>>(5)?,
            ))
        })?;

        let mut records = Vec::new();
        for r in rows {
            let (id, test_name, status_raw, execution_time, timestamp_raw, suite_id) = r?;
            let status = match status_raw.parse::<TestStatus>() {
                Ok(status) => status,
                Err(_) => {
                    warn!(record_id = id, status = %status_raw, "skipping record with unrecognized status");
                    continue;
                }
            };
            records.push(TestExecutionRecord {
                id,
                test_name,
                status,
                execution_time_seconds: execution_time,
                timestamp: parse_timestamp(timestamp_raw.as_deref()),
                suite_id,
                steps: query_steps(&conn, id)?,
            });
        }
        Ok(records)
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn fetch_records(&self, scope: &Scope) -> Result<Vec<TestExecutionRecord>> {
        self.query_records(scope)
    }
}

fn query_steps(conn: &rusqlite::Connection, record_id: i64) -> Result<Vec<TestStep>> {
    let mut stmt = conn.prepare(
        "SELECT step_number, description, status, error_message, timestamp
         FROM test_steps WHERE record_id = ?1 ORDER BY step_number",
    )?;
    let rows = stmt.query_map(rusqlite::params![record_id], |row| {
        Ok(TestStep {
            step_number: row.get(0)?,
            description: row.get(1)?,
            status: StepStatus::from(row.get::<_, String>(2)?),
            error_message: row.get(3)?,
            timestamp: parse_timestamp(row.get::<_, Option<String>>(4)?.as_deref()),
        })
    })?;

    let mut steps = Vec::new();
    for r in rows {
        steps.push(r?);
    }
    Ok(steps)
}

fn resolve_suite(
    conn: &rusqlite::Connection,
    name: &str,
    project_id: Option<i64>,
) -> Result<i64> {
    let normalized = name.to_lowercase();
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM test_suites WHERE name = ?1",
            rusqlite::params![normalized],
            |row| row.get(0),
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other),
        })?;

    if let Some(id) = existing {
        return Ok(id);
    }

    conn.execute(
        "INSERT INTO test_suites (name, project_id) VALUES (?1, ?2)",
        rusqlite::params![normalized, project_id],
    )
    .with_context(|| format!("failed to create suite '{normalized}'"))?;
    Ok(conn.last_insert_rowid())
}

/// Best-effort timestamp parsing. Anything unparseable becomes `None` --
/// such records stay out of time-based series but still count in
/// aggregates.
fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    warn!(timestamp = %raw, "unparseable timestamp, excluding record from time series");
    None
}
