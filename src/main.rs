// src/main.rs
//
// Batch runner: loads punch events, leave calendar and pay profiles from
// JSON, derives canonical attendance for a date range across all employees,
// and writes the daily CSV plus monthly-summary and payroll JSON reports.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod aggregate;
mod batch;
mod hours;
mod payroll;
mod policy;
mod reconcile;
mod report;
mod store;
mod time_parse;

mod hours_tests;
mod payroll_tests;

use aggregate::LeaveOrHolidayEntry;
use batch::BatchRunner;
use payroll::PayProfile;
use policy::EnginePolicy;
use reconcile::PunchEvent;
use store::InMemoryStore;

#[derive(Parser, Debug)]
#[command(
    name = "attendance-core",
    about = "Reconciles punch sources into attendance and payroll reports"
)]
struct Args {
    /// JSON file with raw punch events (biometric and self-report).
    #[arg(long)]
    punches: PathBuf,

    /// JSON file with the leave/holiday calendar for the period.
    #[arg(long)]
    leave: Option<PathBuf>,

    /// JSON file with per-employee pay profiles.
    #[arg(long)]
    profiles: Option<PathBuf>,

    /// First day of the range (YYYY-MM-DD).
    #[arg(long)]
    from: NaiveDate,

    /// Last day of the range, inclusive (YYYY-MM-DD).
    #[arg(long)]
    to: NaiveDate,

    /// Directory the reports are written into.
    #[arg(long, default_value = "reports")]
    out_dir: PathBuf,

    /// Max employees processed in parallel.
    #[arg(long, default_value_t = 8)]
    concurrency: usize,
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string())),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Setting tracing subscriber failed")?;

    let args = Args::parse();
    anyhow::ensure!(
        args.from <= args.to,
        "--from ({}) must not be after --to ({})",
        args.from,
        args.to
    );

    let policy = EnginePolicy::from_env()?;

    let events: Vec<PunchEvent> = load_json(&args.punches)?;
    let leave: Vec<LeaveOrHolidayEntry> = match &args.leave {
        Some(path) => load_json(path)?,
        None => Vec::new(),
    };
    let profiles: Vec<PayProfile> = match &args.profiles {
        Some(path) => load_json(path)?,
        None => Vec::new(),
    };
    info!(
        events = events.len(),
        leave_entries = leave.len(),
        profiles = profiles.len(),
        "Inputs loaded"
    );

    let store = Arc::new(InMemoryStore::new());
    let runner = BatchRunner::new(&policy, args.concurrency);
    let report = runner
        .run(events, leave, profiles, args.from, args.to, store)
        .await;

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;
    report::write_attendance_csv(&args.out_dir.join("attendance.csv"), &report)?;
    report::write_json_report(
        &args.out_dir.join("monthly_summaries.json"),
        &report.summaries,
    )?;
    report::write_json_report(&args.out_dir.join("payroll.json"), &report.payroll)?;
    report::write_json_report(&args.out_dir.join("payroll_rollup.json"), &report.rollup)?;
    if !report.errors.is_empty() {
        warn!(count = report.errors.len(), "Batch finished with skipped rows");
        report::write_json_report(&args.out_dir.join("batch_errors.json"), &report.errors)?;
    }

    info!(
        total_employees = report.rollup.total_employees,
        total_present_days = report.rollup.total_present_days,
        total_hours = %report.rollup.total_hours,
        total_overtime_hours = %report.rollup.total_overtime_hours,
        total_payable = %report.rollup.total_payable,
        "Batch complete"
    );
    Ok(())
}
