// src/policy.rs
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::env;
use std::str::FromStr;
use tracing::info;

/// Immutable policy knobs shared by every engine stage.
///
/// Built once (from env or defaults) and passed into each stage constructor,
/// so unit tests can vary the policy without touching process-wide state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnginePolicy {
    /// Max acceptable disagreement between the two punch sources, per boundary.
    pub tolerance_minutes: i64,
    /// Grace window subtracted from IN and added to OUT before hour math.
    pub allowance_minutes: u32,
    /// Daily hours paid at the base rate; anything above is overtime.
    pub regular_hours_cap: Decimal,
    pub overtime_multiplier: Decimal,
    /// Fixed divisor turning a monthly salary into a daily rate.
    pub salary_month_divisor: Decimal,
    /// Hours in a standard working day (daily rate -> hourly rate).
    pub standard_day_hours: Decimal,
    /// Daily overtime beyond this many hours raises a quality warning.
    pub heavy_overtime_hours: Decimal,
    /// Attendance rate below this fraction raises a quality warning.
    pub attendance_rate_floor: Decimal,
    /// Discrepancies in (medium, high] minutes are "medium" severity.
    pub discrepancy_medium_minutes: i64,
    /// Discrepancies above this many minutes are "high" severity.
    pub discrepancy_high_minutes: i64,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            tolerance_minutes: 20,
            allowance_minutes: 30,
            regular_hours_cap: dec!(8),
            overtime_multiplier: dec!(1.5),
            salary_month_divisor: dec!(31),
            standard_day_hours: dec!(8),
            heavy_overtime_hours: dec!(4),
            attendance_rate_floor: dec!(0.80),
            discrepancy_medium_minutes: 60,
            discrepancy_high_minutes: 120,
        }
    }
}

fn env_parsed<T: FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Invalid value for {}: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

impl EnginePolicy {
    /// Loads the policy from the environment, falling back to the defaults
    /// above for anything unset. `.env` is honored via `dotenv` in `main`.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let policy = Self {
            tolerance_minutes: env_parsed("PUNCH_TOLERANCE_MINUTES", defaults.tolerance_minutes)?,
            allowance_minutes: env_parsed("HOURS_ALLOWANCE_MINUTES", defaults.allowance_minutes)?,
            regular_hours_cap: env_parsed("REGULAR_HOURS_CAP", defaults.regular_hours_cap)?,
            overtime_multiplier: env_parsed("OVERTIME_MULTIPLIER", defaults.overtime_multiplier)?,
            salary_month_divisor: env_parsed(
                "SALARY_MONTH_DIVISOR",
                defaults.salary_month_divisor,
            )?,
            standard_day_hours: env_parsed("STANDARD_DAY_HOURS", defaults.standard_day_hours)?,
            heavy_overtime_hours: env_parsed(
                "HEAVY_OVERTIME_HOURS",
                defaults.heavy_overtime_hours,
            )?,
            attendance_rate_floor: env_parsed(
                "ATTENDANCE_RATE_FLOOR",
                defaults.attendance_rate_floor,
            )?,
            discrepancy_medium_minutes: env_parsed(
                "DISCREPANCY_MEDIUM_MINUTES",
                defaults.discrepancy_medium_minutes,
            )?,
            discrepancy_high_minutes: env_parsed(
                "DISCREPANCY_HIGH_MINUTES",
                defaults.discrepancy_high_minutes,
            )?,
        };
        info!("Engine policy loaded: {:?}", policy);
        Ok(policy)
    }
}
