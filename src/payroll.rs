// src/payroll.rs
//
// Turns an aggregated monthly summary plus a pay profile into a monetary
// breakdown. Discrepancies are never resolved away here: any at all gate the
// line to NeedsReview so a human approves it downstream.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::aggregate::MonthlySummary;
use crate::policy::EnginePolicy;
use crate::reconcile::EmployeeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalaryType {
    Monthly,
    Daily,
    Hourly,
}

/// External pay configuration, read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayProfile {
    pub employee_id: EmployeeId,
    pub salary_type: SalaryType,
    #[serde(default)]
    pub monthly_salary: Option<Decimal>,
    #[serde(default)]
    pub hourly_rate: Option<Decimal>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayrollError {
    #[error("no usable pay rate configured for employee {employee_id}")]
    MissingRateConfiguration { employee_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayrollStatus {
    Processed,
    /// The single gate signalling "do not auto-approve this payroll line".
    NeedsReview,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEarnings {
    pub date: NaiveDate,
    pub total_hours: Decimal,
    pub regular_hours: Decimal,
    pub overtime_hours: Decimal,
    pub earnings: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollBreakdown {
    pub employee_id: EmployeeId,
    pub year: i32,
    pub month: u32,
    pub hourly_rate: Decimal,
    pub overtime_rate: Decimal,
    pub regular_earnings: Decimal,
    pub overtime_earnings: Decimal,
    /// Paid-leave share of the regular earnings, reported for transparency.
    pub leave_earnings: Decimal,
    pub total_earnings: Decimal,
    pub status: PayrollStatus,
    pub daily: Vec<DailyEarnings>,
}

/// Grand total across employees for batch reporting and export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayrollRollup {
    pub total_employees: u32,
    pub total_present_days: u32,
    pub total_hours: Decimal,
    pub total_overtime_hours: Decimal,
    pub total_payable: Decimal,
}

pub struct PayrollCalculator {
    policy: EnginePolicy,
}

impl PayrollCalculator {
    pub fn new(policy: &EnginePolicy) -> Self {
        Self { policy: *policy }
    }

    /// Resolves the hourly rate for a profile: an explicit rate wins,
    /// otherwise monthly salary over the fixed month divisor and standard
    /// day. Daily-salaried employees resolve through the same chain.
    pub fn resolve_hourly_rate(&self, profile: &PayProfile) -> Result<Decimal, PayrollError> {
        if let Some(rate) = profile.hourly_rate {
            return Ok(rate.round_dp(2));
        }
        if let Some(monthly) = profile.monthly_salary {
            let daily = monthly / self.policy.salary_month_divisor;
            return Ok((daily / self.policy.standard_day_hours).round_dp(2));
        }
        Err(PayrollError::MissingRateConfiguration {
            employee_id: profile.employee_id.clone(),
        })
    }

    pub fn compute(
        &self,
        summary: &MonthlySummary,
        profile: &PayProfile,
    ) -> Result<PayrollBreakdown, PayrollError> {
        let hourly_rate = self.resolve_hourly_rate(profile)?;
        let overtime_rate = (hourly_rate * self.policy.overtime_multiplier).round_dp(2);

        let regular_earnings = (summary.regular_hours * hourly_rate).round_dp(2);
        let overtime_earnings = (summary.overtime_hours * overtime_rate).round_dp(2);
        let leave_earnings = (summary.paid_leave_hours * hourly_rate).round_dp(2);
        // Leave hours already sit inside regular_hours, so the grand total is
        // just regular + overtime.
        let total_earnings = regular_earnings + overtime_earnings;

        let status = if summary.discrepancies.is_empty() {
            PayrollStatus::Processed
        } else {
            warn!(
                employee_id = %summary.employee_id,
                year = summary.year,
                month = summary.month,
                count = summary.discrepancies.len(),
                "Payroll line needs review: unresolved punch discrepancies"
            );
            PayrollStatus::NeedsReview
        };

        let daily = summary
            .days
            .iter()
            .map(|record| DailyEarnings {
                date: record.date,
                total_hours: record.hours.total_hours,
                regular_hours: record.hours.regular_hours,
                overtime_hours: record.hours.overtime_hours,
                earnings: (record.hours.regular_hours * hourly_rate
                    + record.hours.overtime_hours * overtime_rate)
                    .round_dp(2),
            })
            .collect();

        debug!(
            employee_id = %summary.employee_id,
            %hourly_rate,
            %total_earnings,
            ?status,
            "Computed payroll breakdown"
        );

        Ok(PayrollBreakdown {
            employee_id: summary.employee_id.clone(),
            year: summary.year,
            month: summary.month,
            hourly_rate,
            overtime_rate,
            regular_earnings,
            overtime_earnings,
            leave_earnings,
            total_earnings,
            status,
            daily,
        })
    }
}

/// Rolls breakdowns and their summaries up into one batch-level total.
pub fn rollup(summaries: &[MonthlySummary], breakdowns: &[PayrollBreakdown]) -> PayrollRollup {
    let mut total = PayrollRollup {
        total_employees: breakdowns.len() as u32,
        ..Default::default()
    };
    for summary in summaries {
        total.total_present_days += summary.days_present;
        total.total_hours += summary.total_hours;
        total.total_overtime_hours += summary.overtime_hours;
    }
    for breakdown in breakdowns {
        total.total_payable += breakdown.total_earnings;
    }
    total.total_hours = total.total_hours.round_dp(2);
    total.total_overtime_hours = total.total_overtime_hours.round_dp(2);
    total.total_payable = total.total_payable.round_dp(2);
    total
}
