// src/reconcile.rs
//
// Merges the biometric punch pair and the self-reported punch pair for one
// employee-day into a single canonical record with provenance and a remark
// describing how (or whether) the two sources agreed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::hours::HoursResult;
use crate::policy::EnginePolicy;
use crate::time_parse::TimeInput;

pub type EmployeeId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunchDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunchSource {
    /// Device clock; trusted as ground truth for arrival.
    Biometric,
    /// Employee "start/end day" event; trusted for departure, since workers
    /// often forget to badge out.
    SelfReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkLocation {
    Office,
    Wfh,
}

/// One observed clock event, immutable as captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PunchEvent {
    pub employee_id: EmployeeId,
    pub date: NaiveDate,
    pub direction: PunchDirection,
    pub source: PunchSource,
    pub timestamp: TimeInput,
    /// Rides on self-report events only; orthogonal to reconciliation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_location: Option<WorkLocation>,
}

/// Which data source(s) contributed to the canonical times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Biometric,
    SelfReport,
    Both,
    /// Set by an upstream manual correction, never by the reconciler.
    Manual,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Remark {
    Matched,
    BiometricMissing,
    SelfReportMissing,
    Mismatch,
    NoPunchOut,
    IncompleteData,
}

/// Per-source optional in/out minutes for one employee-day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourcePair {
    pub in_minutes: Option<u32>,
    pub out_minutes: Option<u32>,
}

impl SourcePair {
    fn is_empty(&self) -> bool {
        self.in_minutes.is_none() && self.out_minutes.is_none()
    }

    fn is_complete(&self) -> bool {
        self.in_minutes.is_some() && self.out_minutes.is_some()
    }
}

/// Everything the reconciler needs for one employee-day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayPunches {
    pub biometric: SourcePair,
    pub self_report: SourcePair,
    pub work_location: Option<WorkLocation>,
}

impl DayPunches {
    /// Folds one parsed punch in. Repeated events collapse to the earliest IN
    /// and the latest OUT per source; the first work-location tag wins.
    pub fn add(
        &mut self,
        source: PunchSource,
        direction: PunchDirection,
        minutes: u32,
        work_location: Option<WorkLocation>,
    ) {
        let pair = match source {
            PunchSource::Biometric => &mut self.biometric,
            PunchSource::SelfReport => &mut self.self_report,
        };
        match direction {
            PunchDirection::In => {
                pair.in_minutes = Some(pair.in_minutes.map_or(minutes, |m| m.min(minutes)));
            }
            PunchDirection::Out => {
                pair.out_minutes = Some(pair.out_minutes.map_or(minutes, |m| m.max(minutes)));
            }
        }
        if source == PunchSource::SelfReport && self.work_location.is_none() {
            self.work_location = work_location;
        }
    }
}

/// The single reconciled attendance record for one employee-day.
/// Unique per (employee_id, date); persisted with upsert-by-key semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalDayRecord {
    pub employee_id: EmployeeId,
    pub date: NaiveDate,
    pub in_minutes: Option<u32>,
    pub out_minutes: Option<u32>,
    pub provenance: Provenance,
    pub remark: Remark,
    /// Largest boundary disagreement when the remark is `Mismatch`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discrepancy_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_location: Option<WorkLocation>,
    /// Filled in by the hours calculator after reconciliation.
    #[serde(default)]
    pub hours: HoursResult,
}

impl CanonicalDayRecord {
    pub fn is_present(&self) -> bool {
        self.provenance != Provenance::None
    }
}

/// Outcome of resolving one boundary (IN or OUT) from the two sources.
#[derive(Debug, Clone, Copy, Default)]
struct BoundaryResolution {
    value: Option<u32>,
    /// Both sources were present for this boundary.
    used_both: bool,
    used_biometric: bool,
    used_self_report: bool,
    /// Disagreement beyond tolerance, in minutes.
    mismatch: Option<i64>,
}

pub struct Reconciler {
    policy: EnginePolicy,
}

impl Reconciler {
    pub fn new(policy: &EnginePolicy) -> Self {
        Self { policy: *policy }
    }

    /// Produces exactly one canonical record for the given employee-day.
    pub fn reconcile(
        &self,
        employee_id: &str,
        date: NaiveDate,
        punches: &DayPunches,
    ) -> CanonicalDayRecord {
        // Asymmetric preference: biometric wins the IN boundary, self-report
        // wins the OUT boundary.
        let in_res = self.resolve_boundary(
            punches.biometric.in_minutes,
            punches.self_report.in_minutes,
            PunchSource::Biometric,
        );
        let out_res = self.resolve_boundary(
            punches.biometric.out_minutes,
            punches.self_report.out_minutes,
            PunchSource::SelfReport,
        );

        let remark = derive_remark(punches, &in_res, &out_res);
        let provenance = derive_provenance(&in_res, &out_res);
        let discrepancy_minutes = match (in_res.mismatch, out_res.mismatch) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        };

        if let Some(diff) = discrepancy_minutes {
            warn!(
                employee_id,
                %date,
                diff_minutes = diff,
                "Punch sources disagree beyond tolerance"
            );
        } else {
            debug!(employee_id, %date, ?remark, "Reconciled employee-day");
        }

        CanonicalDayRecord {
            employee_id: employee_id.to_string(),
            date,
            in_minutes: in_res.value,
            out_minutes: out_res.value,
            provenance,
            remark,
            discrepancy_minutes,
            work_location: punches.work_location,
            hours: HoursResult::default(),
        }
    }

    fn resolve_boundary(
        &self,
        biometric: Option<u32>,
        self_report: Option<u32>,
        preferred: PunchSource,
    ) -> BoundaryResolution {
        match (biometric, self_report) {
            (Some(bio), Some(sr)) => {
                let diff = (i64::from(bio) - i64::from(sr)).abs();
                let value = match preferred {
                    PunchSource::Biometric => bio,
                    PunchSource::SelfReport => sr,
                };
                BoundaryResolution {
                    value: Some(value),
                    used_both: true,
                    used_biometric: true,
                    used_self_report: true,
                    mismatch: (diff > self.policy.tolerance_minutes).then_some(diff),
                }
            }
            (Some(bio), None) => BoundaryResolution {
                value: Some(bio),
                used_biometric: true,
                ..Default::default()
            },
            (None, Some(sr)) => BoundaryResolution {
                value: Some(sr),
                used_self_report: true,
                ..Default::default()
            },
            (None, None) => BoundaryResolution::default(),
        }
    }
}

fn derive_remark(
    punches: &DayPunches,
    in_res: &BoundaryResolution,
    out_res: &BoundaryResolution,
) -> Remark {
    match (in_res.value.is_some(), out_res.value.is_some()) {
        (false, false) => return Remark::IncompleteData,
        (true, false) => return Remark::NoPunchOut,
        // An OUT without any IN is no more usable than an empty day.
        (false, true) => return Remark::IncompleteData,
        (true, true) => {}
    }
    if in_res.mismatch.is_some() || out_res.mismatch.is_some() {
        Remark::Mismatch
    } else if punches.biometric.is_empty() && punches.self_report.is_complete() {
        Remark::BiometricMissing
    } else if punches.self_report.is_empty() && punches.biometric.is_complete() {
        Remark::SelfReportMissing
    } else {
        Remark::Matched
    }
}

fn derive_provenance(in_res: &BoundaryResolution, out_res: &BoundaryResolution) -> Provenance {
    if in_res.used_both || out_res.used_both {
        return Provenance::Both;
    }
    let biometric = in_res.used_biometric || out_res.used_biometric;
    let self_report = in_res.used_self_report || out_res.used_self_report;
    match (biometric, self_report) {
        (true, true) => Provenance::Both,
        (true, false) => Provenance::Biometric,
        (false, true) => Provenance::SelfReport,
        (false, false) => Provenance::None,
    }
}
