//! Database schema and migrations.

use anyhow::Result;
use rusqlite::Connection;

/// Run all pending migrations.
pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS test_suites (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            project_id INTEGER,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS test_records (
            id INTEGER PRIMARY KEY,
            test_name TEXT NOT NULL,
            status TEXT NOT NULL,
            execution_time REAL NOT NULL,
            timestamp TEXT,
            suite_id INTEGER REFERENCES test_suites(id) ON DELETE SET NULL,
            project_id INTEGER,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS test_steps (
            id INTEGER PRIMARY KEY,
            record_id INTEGER NOT NULL REFERENCES test_records(id) ON DELETE CASCADE,
            step_number INTEGER NOT NULL,
            description TEXT NOT NULL,
            status TEXT NOT NULL,
            error_message TEXT,
            timestamp TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_test_records_project ON test_records(project_id);
        CREATE INDEX IF NOT EXISTS idx_test_records_suite ON test_records(suite_id);
        CREATE INDEX IF NOT EXISTS idx_test_records_timestamp ON test_records(timestamp);
        CREATE INDEX IF NOT EXISTS idx_test_steps_record ON test_steps(record_id);
        CREATE INDEX IF NOT EXISTS idx_test_suites_project ON test_suites(project_id);",
    )?;

    Ok(())
}
