// src/payroll_tests.rs

#[cfg(test)]
mod tests {
    use crate::aggregate::{
        DiscrepancyEntry, DiscrepancySeverity, MonthlyAggregator, QualityReport, QualityStatus,
    };
    use crate::hours::{HoursNote, HoursResult};
    use crate::payroll::*;
    use crate::policy::EnginePolicy;
    use crate::reconcile::{CanonicalDayRecord, Provenance, Remark};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn d(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .unwrap_or_else(|_| panic!("Invalid date string format: {}", date_str))
    }

    fn monthly_profile(employee_id: &str, salary: Decimal) -> PayProfile {
        PayProfile {
            employee_id: employee_id.to_string(),
            salary_type: SalaryType::Monthly,
            monthly_salary: Some(salary),
            hourly_rate: None,
        }
    }

    fn empty_quality() -> QualityReport {
        QualityReport {
            overall_status: QualityStatus::Good,
            issues: Vec::new(),
            warnings: Vec::new(),
            info: Vec::new(),
        }
    }

    fn summary_with_hours(
        employee_id: &str,
        regular: Decimal,
        overtime: Decimal,
    ) -> crate::aggregate::MonthlySummary {
        crate::aggregate::MonthlySummary {
            employee_id: employee_id.to_string(),
            year: 2025,
            month: 4,
            days_present: 20,
            days_absent: 2,
            wfh_days: 4,
            office_days: 16,
            total_hours: regular + overtime,
            regular_hours: regular,
            overtime_hours: overtime,
            paid_leave_hours: Decimal::ZERO,
            discrepancies: Vec::new(),
            days: Vec::new(),
            quality: empty_quality(),
        }
    }

    fn calc() -> PayrollCalculator {
        PayrollCalculator::new(&EnginePolicy::default())
    }

    #[test]
    fn derives_hourly_rate_from_monthly_salary() {
        // 24800 / 31 days / 8 hours = 100.00.
        let rate = calc()
            .resolve_hourly_rate(&monthly_profile("E1", dec!(24800)))
            .unwrap();
        assert_eq!(rate, dec!(100.00));
    }

    #[test]
    fn explicit_hourly_rate_wins_over_salary() {
        let profile = PayProfile {
            hourly_rate: Some(dec!(123.45)),
            ..monthly_profile("E1", dec!(24800))
        };
        assert_eq!(calc().resolve_hourly_rate(&profile).unwrap(), dec!(123.45));
    }

    #[test]
    fn missing_rate_configuration_is_an_explicit_error() {
        let profile = PayProfile {
            employee_id: "E9".to_string(),
            salary_type: SalaryType::Hourly,
            monthly_salary: None,
            hourly_rate: None,
        };
        let err = calc()
            .compute(&summary_with_hours("E9", dec!(160), dec!(0)), &profile)
            .unwrap_err();
        assert_eq!(
            err,
            PayrollError::MissingRateConfiguration {
                employee_id: "E9".to_string()
            }
        );
    }

    #[test]
    fn computes_earnings_with_overtime_multiplier() {
        let breakdown = calc()
            .compute(
                &summary_with_hours("E1", dec!(160), dec!(10)),
                &monthly_profile("E1", dec!(24800)),
            )
            .unwrap();
        assert_eq!(breakdown.hourly_rate, dec!(100.00));
        assert_eq!(breakdown.overtime_rate, dec!(150.00));
        assert_eq!(breakdown.regular_earnings, dec!(16000.00));
        assert_eq!(breakdown.overtime_earnings, dec!(1500.00));
        assert_eq!(breakdown.total_earnings, dec!(17500.00));
        assert_eq!(breakdown.status, PayrollStatus::Processed);
    }

    #[test]
    fn leave_earnings_reported_separately_not_double_counted() {
        let mut summary = summary_with_hours("E1", dec!(168), dec!(0));
        summary.paid_leave_hours = dec!(8);
        let breakdown = calc()
            .compute(&summary, &monthly_profile("E1", dec!(24800)))
            .unwrap();
        assert_eq!(breakdown.leave_earnings, dec!(800.00));
        // Leave hours already sit inside regular hours.
        assert_eq!(breakdown.total_earnings, dec!(16800.00));
    }

    #[test]
    fn discrepancies_gate_status_to_needs_review() {
        let mut summary = summary_with_hours("E1", dec!(160), dec!(0));
        summary.discrepancies.push(DiscrepancyEntry {
            date: d("2025-04-03"),
            minutes: 45,
            severity: DiscrepancySeverity::Low,
        });
        let breakdown = calc()
            .compute(&summary, &monthly_profile("E1", dec!(24800)))
            .unwrap();
        assert_eq!(breakdown.status, PayrollStatus::NeedsReview);
    }

    #[test]
    fn daily_breakdown_is_consistent_with_monthly_totals() {
        // Build the summary through the aggregator so the daily rows are real.
        let day = |date: &str, total: Decimal| {
            let regular = total.min(dec!(8));
            CanonicalDayRecord {
                employee_id: "E1".to_string(),
                date: d(date),
                in_minutes: None,
                out_minutes: None,
                provenance: Provenance::Both,
                remark: Remark::Matched,
                discrepancy_minutes: None,
                work_location: None,
                hours: HoursResult {
                    total_hours: total,
                    regular_hours: regular,
                    overtime_hours: total - regular,
                    note: HoursNote::Ok,
                },
            }
        };
        let records = vec![
            day("2025-04-01", dec!(8)),
            day("2025-04-02", dec!(9.83)),
            day("2025-04-03", dec!(7.25)),
        ];
        let summary = MonthlyAggregator::new(&EnginePolicy::default())
            .aggregate("E1", 2025, 4, &records, &[]);
        let breakdown = calc()
            .compute(&summary, &monthly_profile("E1", dec!(24800)))
            .unwrap();

        let daily_total: Decimal = breakdown.daily.iter().map(|e| e.total_hours).sum();
        assert_eq!(daily_total, summary.total_hours);
        let daily_earnings: Decimal = breakdown.daily.iter().map(|e| e.earnings).sum();
        assert_eq!(
            daily_earnings,
            breakdown.regular_earnings + breakdown.overtime_earnings
        );
    }

    #[test]
    fn rollup_totals_across_employees() {
        let s1 = summary_with_hours("E1", dec!(160), dec!(10));
        let s2 = summary_with_hours("E2", dec!(120), dec!(0));
        let b1 = calc()
            .compute(&s1, &monthly_profile("E1", dec!(24800)))
            .unwrap();
        let b2 = calc()
            .compute(&s2, &monthly_profile("E2", dec!(12400)))
            .unwrap();
        let total = rollup(&[s1, s2], &[b1, b2]);
        assert_eq!(total.total_employees, 2);
        assert_eq!(total.total_present_days, 40);
        assert_eq!(total.total_hours, dec!(290));
        assert_eq!(total.total_overtime_hours, dec!(10));
        // 17500 + 120 * 50.
        assert_eq!(total.total_payable, dec!(23500.00));
    }
}
