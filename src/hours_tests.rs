// src/hours_tests.rs

#[cfg(test)]
mod tests {
    use crate::hours::*;
    use crate::policy::EnginePolicy;
    use crate::time_parse::{parse_to_minutes, TimeInput};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn m(clock: &str) -> u32 {
        parse_to_minutes(&TimeInput::Text(clock.to_string()))
            .unwrap_or_else(|| panic!("Invalid clock string: {}", clock))
    }

    fn calc() -> HoursCalculator {
        HoursCalculator::new(&EnginePolicy::default())
    }

    #[test]
    fn missing_boundary_is_a_data_gap() {
        for (in_m, out_m) in [
            (None, None),
            (Some(m("09:00")), None),
            (None, Some(m("17:00"))),
        ] {
            let result = calc().compute(in_m, out_m, true);
            assert_eq!(result.note, HoursNote::MissingTimeData);
            assert!(result.total_hours.is_zero());
            assert!(result.regular_hours.is_zero());
            assert!(result.overtime_hours.is_zero());
        }
    }

    #[test]
    fn allowance_expands_both_boundaries() {
        // 09:10 -> 18:00 with the 30-minute grace on each side becomes
        // 08:40 -> 18:30, i.e. 9.83 hours.
        let result = calc().compute(Some(m("09:10")), Some(m("18:00")), true);
        assert_eq!(result.note, HoursNote::Ok);
        assert_eq!(result.total_hours, dec!(9.83));
        assert_eq!(result.regular_hours, dec!(8));
        assert_eq!(result.overtime_hours, dec!(1.83));
    }

    #[test]
    fn plain_eight_hour_day_without_allowance() {
        let result = calc().compute(Some(m("09:00")), Some(m("17:00")), false);
        assert_eq!(result.note, HoursNote::Ok);
        assert_eq!(result.total_hours, dec!(8));
        assert_eq!(result.overtime_hours, Decimal::ZERO);
    }

    #[test]
    fn allowance_floors_the_in_boundary_at_midnight() {
        let result = calc().compute(Some(m("00:10")), Some(m("08:10")), true);
        // IN clamps to 00:00 instead of going negative.
        assert_eq!(result.total_hours, dec!(8.67));
        assert_eq!(result.note, HoursNote::Ok);
    }

    #[test]
    fn out_before_in_crosses_midnight() {
        let result = calc().compute(Some(m("22:00")), Some(m("02:00")), false);
        assert_eq!(result.note, HoursNote::Ok);
        assert_eq!(result.total_hours, dec!(4));
    }

    #[test]
    fn span_over_24_hours_is_zeroed() {
        // The allowance pushes a 00:00 -> 23:59 span past a full day.
        let result = calc().compute(Some(m("00:00")), Some(m("23:59")), true);
        assert_eq!(result.note, HoursNote::Over24h);
        assert!(result.total_hours.is_zero());
        assert!(result.overtime_hours.is_zero());
    }

    #[test]
    fn invariants_hold_after_rounding() {
        let cases = [
            (Some(m("09:10")), Some(m("18:00")), true),
            (Some(m("08:00")), Some(m("20:07")), false),
            (Some(m("23:00")), Some(m("06:33")), true),
            (Some(m("09:00")), Some(m("09:01")), false),
        ];
        let cap = EnginePolicy::default().regular_hours_cap;
        for (in_m, out_m, allowance) in cases {
            let result = calc().compute(in_m, out_m, allowance);
            assert_eq!(
                result.total_hours,
                result.regular_hours + result.overtime_hours,
                "total != regular + overtime for {:?}",
                (in_m, out_m, allowance)
            );
            assert_eq!(
                result.overtime_hours,
                (result.total_hours - cap).max(Decimal::ZERO)
            );
        }
    }

    #[test]
    fn regular_cap_is_policy_driven() {
        let policy = EnginePolicy {
            regular_hours_cap: dec!(6),
            ..EnginePolicy::default()
        };
        let result =
            HoursCalculator::new(&policy).compute(Some(m("09:00")), Some(m("17:00")), false);
        assert_eq!(result.regular_hours, dec!(6));
        assert_eq!(result.overtime_hours, dec!(2));
    }

    #[test]
    fn zero_length_span_is_ok_and_zero() {
        let result = calc().compute(Some(m("09:00")), Some(m("09:00")), false);
        assert_eq!(result.note, HoursNote::Ok);
        assert!(result.total_hours.is_zero());
    }
}
