use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use testtriage::analysis;
use testtriage::filter::{FilterParams, SortKey};
use testtriage::record::TestExecutionRecord;
use testtriage::store::{RecordSubmission, Scope, SqliteStore};

#[derive(Parser)]
#[command(
    name = "testtriage",
    about = "Decision-ready analytics for test-execution records",
    version,
    long_about = None
)]
struct Cli {
    /// Path to the SQLite record store
    #[arg(long, global = true, default_value = "data/testtriage.db")]
    db: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a JSON file of test-execution records
    Ingest {
        /// File containing a JSON array of records
        #[arg(long)]
        file: String,

        /// Project the records belong to
        #[arg(long)]
        project: i64,
    },

    /// Aggregate summary for a project (or one suite)
    Summary {
        #[arg(long)]
        project: i64,

        /// Narrow to one suite
        #[arg(long)]
        suite: Option<i64>,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// List records matching the supplied filter facets
    Tests {
        #[arg(long)]
        project: i64,

        #[arg(long)]
        suite: Option<i64>,

        /// Filter by status (PASS/FAIL)
        #[arg(long)]
        status: Option<String>,

        /// Filter by test-name substring (case-insensitive)
        #[arg(long)]
        name: Option<String>,

        /// Inclusive start date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,

        /// Inclusive end date (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,

        /// Minimum execution time in seconds
        #[arg(long)]
        min_time: Option<String>,

        /// Maximum execution time in seconds
        #[arg(long)]
        max_time: Option<String>,

        /// Sort key: id, test-name, execution-time, most-recent
        #[arg(long, default_value = "id")]
        sort: String,

        #[arg(long)]
        json: bool,
    },

    /// Trend series for a project (or one suite)
    Trend {
        #[arg(long)]
        project: i64,

        #[arg(long)]
        suite: Option<i64>,

        /// Metric: pass-rate, avg-exec-time, test-count, per-day, per-week
        #[arg(long)]
        metric: String,

        /// Restrict the scope to records on/after this date
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,

        /// Restrict the scope to records on/before this date
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,

        #[arg(long)]
        json: bool,
    },

    /// Error-type distribution and failed tests with their classification
    Errors {
        #[arg(long)]
        project: i64,

        #[arg(long)]
        suite: Option<i64>,

        #[arg(long)]
        json: bool,
    },

    /// Suite distribution and per-suite aggregates
    Suites {
        #[arg(long)]
        project: i64,

        #[arg(long)]
        json: bool,
    },

    /// Top-N rankings by execution time or recency
    Rankings {
        #[arg(long)]
        project: i64,

        #[arg(long)]
        suite: Option<i64>,

        /// Ranking: slowest, fastest, recent
        #[arg(long, default_value = "slowest")]
        metric: String,

        #[arg(long, default_value = "10")]
        limit: usize,

        #[arg(long)]
        json: bool,
    },

    /// Manage the suite registry
    Suite {
        #[command(subcommand)]
        action: SuiteAction,
    },
}

#[derive(Subcommand)]
enum SuiteAction {
    /// List registered suites
    List {
        #[arg(long)]
        project: Option<i64>,
    },

    /// Register a new suite
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        project: Option<i64>,
    },

    /// Rename an existing suite
    Rename {
        #[arg(long)]
        id: i64,

        #[arg(long)]
        name: String,
    },

    /// Delete a suite (its records survive, unassigned)
    Remove {
        #[arg(long)]
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let store = SqliteStore::open(&cli.db)?;

    match cli.command {
        Commands::Ingest { file, project } => {
            tracing::info!(%file, %project, "Ingesting records");
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {file}"))?;
            let submissions: Vec<RecordSubmission> =
                serde_json::from_str(&raw).context("malformed record file")?;

            let mut inserted = 0usize;
            for submission in &submissions {
                store.insert_record(project, submission)?;
                inserted += 1;
            }
            println!("Ingested {} record(s) into project {}.", inserted, project);
        }

        Commands::Summary { project, suite, json } => {
            let scope = scope_of(project, suite);
            let records = testtriage::scoped_records(
                &store,
                &scope,
                &FilterParams::default(),
                SortKey::Id,
            )
            .await?;
            let summary = analysis::aggregate(&records);

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("\n=== Test Summary (project {}) ===", project);
                println!("Total tests:    {}", summary.total_tests);
                println!("Passed:         {}", summary.passed_tests);
                println!("Failed:         {}", summary.failed_tests);
                println!("Pass rate:      {:.2}%", summary.pass_rate);
                println!("Avg exec time:  {:.2}s", summary.avg_execution_time);
            }
        }

        Commands::Tests {
            project,
            suite,
            status,
            name,
            start_date,
            end_date,
            min_time,
            max_time,
            sort,
            json,
        } => {
            let params = FilterParams {
                status,
                test_name: name,
                start_date,
                end_date,
                min_execution_time: min_time,
                max_execution_time: max_time,
                suite_id: suite,
            };
            let sort: SortKey = sort.parse()?;
            let scope = scope_of(project, None);
            let records = testtriage::scoped_records(&store, &scope, &params, sort).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("No tests found for this project (or filter).");
            } else {
                println!("{:<6} | {:<30} | {:<6} | {:>9} | Started At", "ID", "Test Name", "Status", "Time (s)");
                println!("{:-<6}-|-{:-<30}-|-{:-<6}-|-{:-<9}-|-{:-<25}", "", "", "", "", "");
                for record in &records {
                    println!(
                        "{:<6} | {:<30} | {:<6} | {:>9.2} | {}",
                        record.id,
                        record.test_name,
                        record.status.as_str(),
                        record.execution_time_seconds,
                        started_at_label(record),
                    );
                }
            }
        }

        Commands::Trend {
            project,
            suite,
            metric,
            from,
            to,
            json,
        } => {
            let kind: analysis::MetricKind = metric.parse().map_err(anyhow::Error::msg)?;
            let mut scope = scope_of(project, suite);
            if let (Some(from), Some(to)) = (from, to) {
                scope.date_range = Some((from, to));
            }
            let records = testtriage::scoped_records(
                &store,
                &scope,
                &FilterParams::default(),
                SortKey::Id,
            )
            .await?;
            let series = analysis::build_trend(&records, kind);

            if json {
                println!("{}", serde_json::to_string_pretty(&series)?);
            } else if series.is_empty() {
                println!("No data points for this scope.");
            } else {
                println!("{:<12} | Value", "Label");
                println!("{:-<12}-|-{:-<12}", "", "");
                for point in &series {
                    println!("{:<12} | {:.2}", point.label, point.value);
                }
            }
        }

        Commands::Errors { project, suite, json } => {
            let scope = scope_of(project, suite);
            let records = testtriage::scoped_records(
                &store,
                &scope,
                &FilterParams::default(),
                SortKey::Id,
            )
            .await?;
            let distribution = analysis::error_distribution(&records);
            let failed: Vec<&TestExecutionRecord> = records
                .iter()
                .filter(|r| r.status == testtriage::record::TestStatus::Fail)
                .collect();

            if json {
                let failed_rows: Vec<serde_json::Value> = failed
                    .iter()
                    .map(|r| {
                        serde_json::json!({
                            "id": r.id,
                            "test_name": r.test_name,
                            "error_type": analysis::record_error_type(r),
                            "execution_time_seconds": r.execution_time_seconds,
                        })
                    })
                    .collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "distribution": distribution,
                        "failed_tests": failed_rows,
                    }))?
                );
            } else {
                println!("\n=== Error Types (project {}) ===", project);
                if distribution.is_empty() {
                    println!("No classified errors.");
                }
                for bucket in &distribution {
                    println!("{:<40} : {}", bucket.label, bucket.count);
                }

                println!("\n=== Failed Tests ===");
                if failed.is_empty() {
                    println!("No failed tests found.");
                } else {
                    println!("{:<30} | {:<30} | {:>9} | Started At", "Test Name", "Error Type", "Time (s)");
                    println!("{:-<30}-|-{:-<30}-|-{:-<9}-|-{:-<25}", "", "", "", "");
                    for record in &failed {
                        println!(
                            "{:<30} | {:<30} | {:>9.2} | {}",
                            record.test_name,
                            analysis::record_error_type(record),
                            record.execution_time_seconds,
                            started_at_label(record),
                        );
                    }
                }
            }
        }

        Commands::Suites { project, json } => {
            let scope = scope_of(project, None);
            let records = testtriage::scoped_records(
                &store,
                &scope,
                &FilterParams::default(),
                SortKey::Id,
            )
            .await?;
            let suites = store.list_suites(Some(project))?;
            let distribution = analysis::suite_distribution(&records, &suites);
            let breakdowns = analysis::aggregate_by_suite(&records, &suites);

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "distribution": distribution,
                        "breakdowns": breakdowns,
                    }))?
                );
            } else {
                println!("\n=== Suite Distribution (project {}) ===", project);
                for slice in &distribution {
                    println!("{:<25} : {}", slice.suite_label, slice.count);
                }

                println!("\n=== Per-Suite Breakdown ===");
                if breakdowns.is_empty() {
                    println!("No suite has records yet.");
                } else {
                    println!("{:<25} | {:>5} | {:>6} | {:>6} | {:>9} | Avg Time", "Suite", "Total", "Passed", "Failed", "Pass Rate");
                    println!("{:-<25}-|-{:-<5}-|-{:-<6}-|-{:-<6}-|-{:-<9}-|-{:-<9}", "", "", "", "", "", "");
                    for b in &breakdowns {
                        println!(
                            "{:<25} | {:>5} | {:>6} | {:>6} | {:>8.1}% | {:.2}s",
                            b.suite_name,
                            b.total_tests,
                            b.passed_tests,
                            b.failed_tests,
                            b.pass_rate,
                            b.avg_execution_time,
                        );
                    }
                }
            }
        }

        Commands::Rankings {
            project,
            suite,
            metric,
            limit,
            json,
        } => {
            let scope = scope_of(project, suite);
            let records = testtriage::scoped_records(
                &store,
                &scope,
                &FilterParams::default(),
                SortKey::Id,
            )
            .await?;
            let ranked: Vec<&TestExecutionRecord> = match metric.as_str() {
                "slowest" => analysis::ranking::top_slowest(&records, limit),
                "fastest" => analysis::ranking::top_fastest(&records, limit),
                "recent" => analysis::ranking::last_n_chronological(&records, limit),
                other => anyhow::bail!("unknown ranking '{other}' (expected slowest, fastest or recent)"),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&ranked)?);
            } else if ranked.is_empty() {
                println!("No records in scope.");
            } else {
                println!("{:<30} | {:<6} | {:>9} | Started At", "Test Name", "Status", "Time (s)");
                println!("{:-<30}-|-{:-<6}-|-{:-<9}-|-{:-<25}", "", "", "", "");
                for record in &ranked {
                    println!(
                        "{:<30} | {:<6} | {:>9.2} | {}",
                        record.test_name,
                        record.status.as_str(),
                        record.execution_time_seconds,
                        started_at_label(record),
                    );
                }
            }
        }

        Commands::Suite { action } => match action {
            SuiteAction::List { project } => {
                let suites = store.list_suites(project)?;
                if suites.is_empty() {
                    println!("No suites found.");
                } else {
                    println!("{:<6} | {:<25} | Project", "ID", "Name");
                    println!("{:-<6}-|-{:-<25}-|-{:-<8}", "", "", "");
                    for suite in suites {
                        println!(
                            "{:<6} | {:<25} | {}",
                            suite.id,
                            suite.name,
                            suite
                                .project_id
                                .map(|p| p.to_string())
                                .unwrap_or_else(|| "-".to_string()),
                        );
                    }
                }
            }
            SuiteAction::Add { name, project } => {
                let id = store.create_suite(&name, project)?;
                println!("Suite '{}' created with id {}.", name, id);
            }
            SuiteAction::Rename { id, name } => {
                store.rename_suite(id, &name)?;
                println!("Suite {} renamed to '{}'.", id, name);
            }
            SuiteAction::Remove { id } => {
                store.delete_suite(id)?;
                println!("Suite {} removed; its records are now unassigned.", id);
            }
        },
    }

    Ok(())
}

fn scope_of(project: i64, suite: Option<i64>) -> Scope {
    let mut scope = Scope::new(project);
    scope.suite_id = suite;
    scope
}

fn started_at_label(record: &TestExecutionRecord) -> String {
    record
        .started_at()
        .map(|ts| ts.to_rfc3339())
        .unwrap_or_else(|| "-".to_string())
}
