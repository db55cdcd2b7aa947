// src/report.rs
//
// Report writers consumed by export and dashboards. The daily CSV carries the
// full consumer contract: date, employee, resolved times, worked hours,
// remark/provenance, payroll status and computed earnings.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::batch::BatchReport;
use crate::payroll::PayrollStatus;
use crate::time_parse::minutes_to_hhmm;

#[derive(Debug, Serialize)]
struct AttendanceRow<'a> {
    date: NaiveDate,
    employee_id: &'a str,
    in_time: String,
    out_time: String,
    total_hours: Decimal,
    regular_hours: Decimal,
    overtime_hours: Decimal,
    provenance: String,
    remark: String,
    note: String,
    discrepancy_minutes: Option<i64>,
    status: String,
    earnings: Option<Decimal>,
}

fn enum_label<T: Serialize>(value: &T) -> String {
    // All report enums serialize to plain snake_case strings.
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(String::from))
        .unwrap_or_default()
}

/// Writes the daily attendance report for a finished batch.
pub fn write_attendance_csv(path: &Path, report: &BatchReport) -> Result<()> {
    // Payroll status per (employee, year, month) and earnings per
    // (employee, date), for joining onto the daily rows.
    let mut status_by_period: HashMap<(&str, i32, u32), PayrollStatus> = HashMap::new();
    let mut earnings_by_day: HashMap<(&str, NaiveDate), Decimal> = HashMap::new();
    for breakdown in &report.payroll {
        status_by_period.insert(
            (breakdown.employee_id.as_str(), breakdown.year, breakdown.month),
            breakdown.status,
        );
        for day in &breakdown.daily {
            earnings_by_day.insert((breakdown.employee_id.as_str(), day.date), day.earnings);
        }
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV report at {}", path.display()))?;
    for record in &report.records {
        let status = status_by_period
            .get(&(
                record.employee_id.as_str(),
                record.date.year(),
                record.date.month(),
            ))
            .map(|s| enum_label(s))
            .unwrap_or_default();
        writer
            .serialize(AttendanceRow {
                date: record.date,
                employee_id: &record.employee_id,
                in_time: record.in_minutes.map(minutes_to_hhmm).unwrap_or_default(),
                out_time: record.out_minutes.map(minutes_to_hhmm).unwrap_or_default(),
                total_hours: record.hours.total_hours,
                regular_hours: record.hours.regular_hours,
                overtime_hours: record.hours.overtime_hours,
                provenance: enum_label(&record.provenance),
                remark: enum_label(&record.remark),
                note: enum_label(&record.hours.note),
                discrepancy_minutes: record.discrepancy_minutes,
                status,
                earnings: earnings_by_day
                    .get(&(record.employee_id.as_str(), record.date))
                    .copied(),
            })
            .context("Failed to write CSV row")?;
    }
    writer.flush().context("Failed to flush CSV report")?;
    info!(rows = report.records.len(), path = %path.display(), "Wrote attendance CSV");
    Ok(())
}

/// Pretty-printed JSON report file.
pub fn write_json_report<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json_string = serde_json::to_string_pretty(value)?;
    fs::write(path, json_string)
        .with_context(|| format!("Failed to write JSON report at {}", path.display()))?;
    info!(path = %path.display(), "Wrote JSON report");
    Ok(())
}
