// src/aggregate.rs
//
// Rolls canonical day records up into a monthly summary: presence counters,
// hour totals, folded-in paid leave, discrepancy list and a data-quality
// report. Pure function of its inputs; re-running over the same records
// yields an identical summary.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::hours::HoursNote;
use crate::policy::EnginePolicy;
use crate::reconcile::{CanonicalDayRecord, EmployeeId, Provenance, Remark, WorkLocation};

/// Paid-leave / holiday calendar entry. External configuration, read-only
/// to the engine; never participates in punch reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveOrHolidayEntry {
    /// `None` marks a global entry (company holiday) applying to everyone.
    #[serde(default)]
    pub employee_id: Option<EmployeeId>,
    pub date: NaiveDate,
    pub hours: Decimal,
    pub paid: bool,
    #[serde(default)]
    pub count_as_working: bool,
    pub leave_type: String,
}

impl LeaveOrHolidayEntry {
    fn applies_to(&self, employee_id: &str) -> bool {
        self.employee_id
            .as_deref()
            .map_or(true, |id| id == employee_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancySeverity {
    /// Above tolerance but under an hour.
    Low,
    /// One to two hours.
    Medium,
    /// More than two hours.
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscrepancyEntry {
    pub date: NaiveDate,
    pub minutes: i64,
    pub severity: DiscrepancySeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityStatus {
    Good,
    ReviewRecommended,
    NeedsAttention,
}

/// One finding in the quality report; `dates` lists the affected days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityFinding {
    pub code: String,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dates: Vec<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub overall_status: QualityStatus,
    pub issues: Vec<QualityFinding>,
    pub warnings: Vec<QualityFinding>,
    pub info: Vec<QualityFinding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub employee_id: EmployeeId,
    pub year: i32,
    pub month: u32,
    pub days_present: u32,
    pub days_absent: u32,
    pub wfh_days: u32,
    pub office_days: u32,
    pub total_hours: Decimal,
    pub regular_hours: Decimal,
    pub overtime_hours: Decimal,
    /// Paid leave hours already folded into the totals above, kept separate
    /// so payroll can report them transparently.
    pub paid_leave_hours: Decimal,
    pub discrepancies: Vec<DiscrepancyEntry>,
    /// The day records the summary was derived from, sorted by date.
    pub days: Vec<CanonicalDayRecord>,
    pub quality: QualityReport,
}

pub struct MonthlyAggregator {
    policy: EnginePolicy,
}

impl MonthlyAggregator {
    pub fn new(policy: &EnginePolicy) -> Self {
        Self { policy: *policy }
    }

    pub fn aggregate(
        &self,
        employee_id: &str,
        year: i32,
        month: u32,
        records: &[CanonicalDayRecord],
        leave: &[LeaveOrHolidayEntry],
    ) -> MonthlySummary {
        let mut days: Vec<CanonicalDayRecord> = records
            .iter()
            .filter(|r| {
                r.employee_id == employee_id && r.date.year() == year && r.date.month() == month
            })
            .cloned()
            .collect();
        days.sort_by_key(|r| r.date);

        let mut days_present = 0u32;
        let mut days_absent = 0u32;
        let mut wfh_days = 0u32;
        let mut office_days = 0u32;
        let mut total_hours = Decimal::ZERO;
        let mut regular_hours = Decimal::ZERO;
        let mut overtime_hours = Decimal::ZERO;
        let mut discrepancies = Vec::new();
        let mut present_dates = Vec::new();

        for record in &days {
            if record.is_present() {
                days_present += 1;
                present_dates.push(record.date);
                // The work-location tag is an orthogonal attribute of a
                // present day; untagged days default to the office.
                match record.work_location {
                    Some(WorkLocation::Wfh) => wfh_days += 1,
                    _ => office_days += 1,
                }
            } else {
                days_absent += 1;
            }
            total_hours += record.hours.total_hours;
            regular_hours += record.hours.regular_hours;
            overtime_hours += record.hours.overtime_hours;

            if let Some(minutes) = record.discrepancy_minutes {
                discrepancies.push(DiscrepancyEntry {
                    date: record.date,
                    minutes,
                    severity: self.bucket_discrepancy(minutes),
                });
            }
        }

        // Paid leave that counts as working time contributes its configured
        // hours as if worked, without touching provenance or remarks.
        let mut paid_leave_hours = Decimal::ZERO;
        let mut leave_in_month: Vec<&LeaveOrHolidayEntry> = leave
            .iter()
            .filter(|e| {
                e.applies_to(employee_id)
                    && e.date.year() == year
                    && e.date.month() == month
                    && e.paid
                    && e.count_as_working
            })
            .collect();
        leave_in_month.sort_by_key(|e| e.date);
        for entry in leave_in_month {
            paid_leave_hours += entry.hours;
            total_hours += entry.hours;
            regular_hours += entry.hours;
            // A paid leave day on an already-present date must not count
            // presence twice.
            if !present_dates.contains(&entry.date) {
                days_present += 1;
                present_dates.push(entry.date);
            }
        }

        let quality = self.build_quality_report(&days, &discrepancies, days_present, days_absent);

        debug!(
            employee_id,
            year,
            month,
            days_present,
            days_absent,
            %total_hours,
            "Aggregated month"
        );

        MonthlySummary {
            employee_id: employee_id.to_string(),
            year,
            month,
            days_present,
            days_absent,
            wfh_days,
            office_days,
            total_hours: total_hours.round_dp(2),
            regular_hours: regular_hours.round_dp(2),
            overtime_hours: overtime_hours.round_dp(2),
            paid_leave_hours: paid_leave_hours.round_dp(2),
            discrepancies,
            days,
            quality,
        }
    }

    fn bucket_discrepancy(&self, minutes: i64) -> DiscrepancySeverity {
        if minutes > self.policy.discrepancy_high_minutes {
            DiscrepancySeverity::High
        } else if minutes >= self.policy.discrepancy_medium_minutes {
            DiscrepancySeverity::Medium
        } else {
            DiscrepancySeverity::Low
        }
    }

    fn build_quality_report(
        &self,
        days: &[CanonicalDayRecord],
        discrepancies: &[DiscrepancyEntry],
        days_present: u32,
        days_absent: u32,
    ) -> QualityReport {
        let mut issues = Vec::new();
        let mut warnings = Vec::new();
        let mut info = Vec::new();

        let incomplete_dates: Vec<NaiveDate> = days
            .iter()
            .filter(|r| {
                r.hours.note == HoursNote::MissingTimeData && r.remark == Remark::IncompleteData
            })
            .map(|r| r.date)
            .collect();
        if !incomplete_dates.is_empty() {
            issues.push(QualityFinding {
                code: "incomplete_data".to_string(),
                detail: format!(
                    "{} day(s) with no usable punch data",
                    incomplete_dates.len()
                ),
                dates: incomplete_dates,
            });
        }

        let high_dates: Vec<NaiveDate> = discrepancies
            .iter()
            .filter(|d| d.severity == DiscrepancySeverity::High)
            .map(|d| d.date)
            .collect();
        if !high_dates.is_empty() {
            issues.push(QualityFinding {
                code: "discrepancy_high".to_string(),
                detail: format!(
                    "{} day(s) where the punch sources disagree by more than {} minutes",
                    high_dates.len(),
                    self.policy.discrepancy_high_minutes
                ),
                dates: high_dates,
            });
        }

        let medium_dates: Vec<NaiveDate> = discrepancies
            .iter()
            .filter(|d| d.severity == DiscrepancySeverity::Medium)
            .map(|d| d.date)
            .collect();
        if !medium_dates.is_empty() {
            warnings.push(QualityFinding {
                code: "discrepancy_medium".to_string(),
                detail: format!(
                    "{} day(s) with a one-to-two-hour punch disagreement",
                    medium_dates.len()
                ),
                dates: medium_dates,
            });
        }

        let heavy_overtime_dates: Vec<NaiveDate> = days
            .iter()
            .filter(|r| r.hours.overtime_hours > self.policy.heavy_overtime_hours)
            .map(|r| r.date)
            .collect();
        if !heavy_overtime_dates.is_empty() {
            warnings.push(QualityFinding {
                code: "heavy_overtime".to_string(),
                detail: format!(
                    "{} day(s) with more than {} overtime hours",
                    heavy_overtime_dates.len(),
                    self.policy.heavy_overtime_hours
                ),
                dates: heavy_overtime_dates,
            });
        }

        let classified = days_present + days_absent;
        if classified > 0 {
            let rate = Decimal::from(days_present) / Decimal::from(classified);
            if rate < self.policy.attendance_rate_floor {
                warnings.push(QualityFinding {
                    code: "low_attendance_rate".to_string(),
                    detail: format!("attendance rate {}", rate.round_dp(2)),
                    dates: Vec::new(),
                });
            }
        }

        let biometric_only = days
            .iter()
            .filter(|r| r.provenance == Provenance::Biometric)
            .count();
        let self_report_only = days
            .iter()
            .filter(|r| r.provenance == Provenance::SelfReport)
            .count();
        let both = days
            .iter()
            .filter(|r| r.provenance == Provenance::Both)
            .count();
        info.push(QualityFinding {
            code: "provenance_breakdown".to_string(),
            detail: format!(
                "biometric_only={} self_report_only={} both={}",
                biometric_only, self_report_only, both
            ),
            dates: Vec::new(),
        });

        let overall_status = if !issues.is_empty() {
            QualityStatus::NeedsAttention
        } else if !warnings.is_empty() {
            QualityStatus::ReviewRecommended
        } else {
            QualityStatus::Good
        };

        QualityReport {
            overall_status,
            issues,
            warnings,
            info,
        }
    }
}
