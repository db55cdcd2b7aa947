// src/hours.rs
//
// Converts a canonical in/out pair into regular/overtime/total hours under
// the allowance and anomaly rules.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::policy::EnginePolicy;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Diagnostic attached to every hours computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoursNote {
    Ok,
    /// One or both boundaries were never resolved; treated as a data gap.
    MissingTimeData,
    /// Negative span even after the midnight adjustment.
    InvalidRange,
    /// Span longer than a day; almost certainly a data-entry error.
    Over24h,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoursResult {
    pub total_hours: Decimal,
    pub regular_hours: Decimal,
    pub overtime_hours: Decimal,
    pub note: HoursNote,
}

impl HoursResult {
    pub fn zeroed(note: HoursNote) -> Self {
        Self {
            total_hours: Decimal::ZERO,
            regular_hours: Decimal::ZERO,
            overtime_hours: Decimal::ZERO,
            note,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.note == HoursNote::Ok
    }
}

impl Default for HoursResult {
    fn default() -> Self {
        Self::zeroed(HoursNote::MissingTimeData)
    }
}

pub struct HoursCalculator {
    policy: EnginePolicy,
}

impl HoursCalculator {
    pub fn new(policy: &EnginePolicy) -> Self {
        Self { policy: *policy }
    }

    /// Computes worked hours for one day. Never panics; malformed input comes
    /// back as a zeroed result with a diagnostic note.
    pub fn compute(
        &self,
        in_minutes: Option<u32>,
        out_minutes: Option<u32>,
        apply_allowance: bool,
    ) -> HoursResult {
        let (Some(in_raw), Some(out_raw)) = (in_minutes, out_minutes) else {
            return HoursResult::zeroed(HoursNote::MissingTimeData);
        };

        let mut in_m = i64::from(in_raw);
        let mut out_m = i64::from(out_raw);
        if apply_allowance {
            // Early arrival / late departure the punch tolerance cannot see.
            in_m = (in_m - i64::from(self.policy.allowance_minutes)).max(0);
            out_m += i64::from(self.policy.allowance_minutes);
        }
        if out_m < in_m {
            // Shift crossed midnight.
            out_m += MINUTES_PER_DAY;
        }

        let total_raw = Decimal::from(out_m - in_m) / dec!(60);
        if total_raw > dec!(24) {
            debug!(
                in_minutes = in_m,
                out_minutes = out_m,
                "Span exceeds 24h, zeroing hours"
            );
            return HoursResult::zeroed(HoursNote::Over24h);
        }
        if total_raw < Decimal::ZERO {
            return HoursResult::zeroed(HoursNote::InvalidRange);
        }

        // Round the total first, then split, so the invariant
        // total == regular + overtime holds exactly after rounding.
        let total = total_raw.round_dp(2);
        let regular = total.min(self.policy.regular_hours_cap);
        let overtime = total - regular;
        HoursResult {
            total_hours: total,
            regular_hours: regular,
            overtime_hours: overtime,
            note: HoursNote::Ok,
        }
    }
}
