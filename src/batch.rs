// src/batch.rs
//
// Batch derivation of attendance for a date range. Work decomposes by
// employee: units are independent, run on a bounded tokio pool, and a failure
// in one unit never aborts the others. Sequential execution would produce
// identical output; results are sorted before they leave this module.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::aggregate::{LeaveOrHolidayEntry, MonthlyAggregator, MonthlySummary};
use crate::hours::HoursCalculator;
use crate::payroll::{rollup, PayProfile, PayrollBreakdown, PayrollCalculator, PayrollRollup};
use crate::policy::EnginePolicy;
use crate::reconcile::{CanonicalDayRecord, DayPunches, PunchEvent, Reconciler};
use crate::store::AttendanceStore;
use crate::time_parse::parse_to_minutes;

/// A skipped input row or failed unit, with the offending key and reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    pub employee_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub records: Vec<CanonicalDayRecord>,
    pub summaries: Vec<MonthlySummary>,
    pub payroll: Vec<PayrollBreakdown>,
    pub rollup: PayrollRollup,
    pub errors: Vec<RowError>,
}

struct UnitOutput {
    records: Vec<CanonicalDayRecord>,
    summaries: Vec<MonthlySummary>,
    payroll: Vec<PayrollBreakdown>,
    errors: Vec<RowError>,
}

pub struct BatchRunner {
    policy: EnginePolicy,
    concurrency: usize,
}

impl BatchRunner {
    pub fn new(policy: &EnginePolicy, concurrency: usize) -> Self {
        Self {
            policy: *policy,
            concurrency: concurrency.max(1),
        }
    }

    /// Derives attendance, monthly summaries and payroll for every employee
    /// appearing in the punch events or pay profiles, over `from..=to`.
    pub async fn run(
        &self,
        events: Vec<PunchEvent>,
        leave: Vec<LeaveOrHolidayEntry>,
        profiles: Vec<PayProfile>,
        from: NaiveDate,
        to: NaiveDate,
        store: Arc<dyn AttendanceStore>,
    ) -> BatchReport {
        let mut events_by_employee: HashMap<String, Vec<PunchEvent>> = HashMap::new();
        for event in events {
            events_by_employee
                .entry(event.employee_id.clone())
                .or_default()
                .push(event);
        }
        let profiles_by_employee: HashMap<String, PayProfile> = profiles
            .into_iter()
            .map(|p| (p.employee_id.clone(), p))
            .collect();

        let mut employee_ids: Vec<String> = events_by_employee
            .keys()
            .chain(profiles_by_employee.keys())
            .cloned()
            .collect();
        employee_ids.sort();
        employee_ids.dedup();

        info!(
            employees = employee_ids.len(),
            %from,
            %to,
            concurrency = self.concurrency,
            "Starting attendance batch"
        );

        let leave = Arc::new(leave);
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(employee_ids.len());

        for employee_id in employee_ids {
            let unit_events = events_by_employee.remove(&employee_id).unwrap_or_default();
            let profile = profiles_by_employee.get(&employee_id).cloned();
            let leave = leave.clone();
            let store = store.clone();
            let semaphore = semaphore.clone();
            let policy = self.policy;

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return UnitOutput {
                            records: Vec::new(),
                            summaries: Vec::new(),
                            payroll: Vec::new(),
                            errors: vec![RowError {
                                employee_id: employee_id.clone(),
                                date: None,
                                reason: "worker pool shut down before unit ran".to_string(),
                            }],
                        }
                    }
                };
                process_employee(
                    &policy,
                    &employee_id,
                    unit_events,
                    &leave,
                    profile.as_ref(),
                    from,
                    to,
                    store.as_ref(),
                )
            });
            handles.push(handle);
        }

        let mut report = BatchReport::default();
        for handle in handles {
            match handle.await {
                Ok(output) => {
                    report.records.extend(output.records);
                    report.summaries.extend(output.summaries);
                    report.payroll.extend(output.payroll);
                    report.errors.extend(output.errors);
                }
                Err(join_err) => {
                    // One unit blowing up must not take the batch with it.
                    warn!(error = %join_err, "Batch unit panicked");
                    report.errors.push(RowError {
                        employee_id: String::new(),
                        date: None,
                        reason: format!("batch unit failed: {}", join_err),
                    });
                }
            }
        }

        report
            .records
            .sort_by(|a, b| (&a.employee_id, a.date).cmp(&(&b.employee_id, b.date)));
        report
            .summaries
            .sort_by(|a, b| (&a.employee_id, a.year, a.month).cmp(&(&b.employee_id, b.year, b.month)));
        report
            .payroll
            .sort_by(|a, b| (&a.employee_id, a.year, a.month).cmp(&(&b.employee_id, b.year, b.month)));
        report.rollup = rollup(&report.summaries, &report.payroll);

        info!(
            records = report.records.len(),
            summaries = report.summaries.len(),
            payroll_lines = report.payroll.len(),
            errors = report.errors.len(),
            "Attendance batch finished"
        );
        report
    }
}

#[allow(clippy::too_many_arguments)]
fn process_employee(
    policy: &EnginePolicy,
    employee_id: &str,
    events: Vec<PunchEvent>,
    leave: &[LeaveOrHolidayEntry],
    profile: Option<&PayProfile>,
    from: NaiveDate,
    to: NaiveDate,
    store: &dyn AttendanceStore,
) -> UnitOutput {
    let reconciler = Reconciler::new(policy);
    let hours_calc = HoursCalculator::new(policy);
    let aggregator = MonthlyAggregator::new(policy);
    let payroll_calc = PayrollCalculator::new(policy);

    let mut errors = Vec::new();
    let mut punches_by_date: HashMap<NaiveDate, DayPunches> = HashMap::new();

    for event in events {
        if event.date < from || event.date > to {
            errors.push(RowError {
                employee_id: employee_id.to_string(),
                date: Some(event.date),
                reason: "punch event outside batch range".to_string(),
            });
            continue;
        }
        match parse_to_minutes(&event.timestamp) {
            Some(minutes) => {
                punches_by_date.entry(event.date).or_default().add(
                    event.source,
                    event.direction,
                    minutes,
                    event.work_location,
                );
            }
            None => {
                // Degrades that boundary to a data gap downstream.
                errors.push(RowError {
                    employee_id: employee_id.to_string(),
                    date: Some(event.date),
                    reason: format!("unparseable punch timestamp: {:?}", event.timestamp),
                });
            }
        }
    }

    // One canonical record per employee-day across the whole range; days
    // without any usable punches still get a provenance-None record so the
    // aggregation can count them absent.
    let mut records = Vec::new();
    let empty = DayPunches::default();
    let mut date = from;
    while date <= to {
        let punches = punches_by_date.get(&date).unwrap_or(&empty);
        let mut record = reconciler.reconcile(employee_id, date, punches);
        record.hours = hours_calc.compute(record.in_minutes, record.out_minutes, true);
        store.put(record.clone());
        records.push(record);
        match date.checked_add_days(Days::new(1)) {
            Some(next) => date = next,
            None => break,
        }
    }

    let mut summaries = Vec::new();
    let mut payroll = Vec::new();
    for (year, month) in months_in_range(from, to) {
        let month_records = store.range(employee_id, from, to);
        let summary = aggregator.aggregate(employee_id, year, month, &month_records, leave);
        match profile {
            Some(profile) => match payroll_calc.compute(&summary, profile) {
                Ok(breakdown) => payroll.push(breakdown),
                Err(err) => errors.push(RowError {
                    employee_id: employee_id.to_string(),
                    date: None,
                    reason: err.to_string(),
                }),
            },
            None => errors.push(RowError {
                employee_id: employee_id.to_string(),
                date: None,
                reason: format!("no pay profile for period {}-{:02}", year, month),
            }),
        }
        summaries.push(summary);
    }

    UnitOutput {
        records,
        summaries,
        payroll,
        errors,
    }
}

fn months_in_range(from: NaiveDate, to: NaiveDate) -> Vec<(i32, u32)> {
    let mut months = Vec::new();
    let (mut year, mut month) = (from.year(), from.month());
    loop {
        months.push((year, month));
        if (year, month) >= (to.year(), to.month()) {
            break;
        }
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    months
}
