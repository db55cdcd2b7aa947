// src/store.rs
//
// Canonical day records persist through a narrow upsert-by-key contract:
// last write for an (employee_id, date) key wins, which makes repeated runs
// over the same window idempotent and safe to retry.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use crate::reconcile::{CanonicalDayRecord, EmployeeId};

pub type RecordKey = (EmployeeId, NaiveDate);

/// Storage seam for canonical day records. The engine only ever needs
/// last-write-wins puts and range reads; persistence technology stays on the
/// caller's side of this trait.
pub trait AttendanceStore: Send + Sync {
    /// Upserts the record under its (employee_id, date) key.
    fn put(&self, record: CanonicalDayRecord);

    fn get(&self, employee_id: &str, date: NaiveDate) -> Option<CanonicalDayRecord>;

    /// All records for one employee with `from <= date <= to`, sorted by date.
    fn range(&self, employee_id: &str, from: NaiveDate, to: NaiveDate)
        -> Vec<CanonicalDayRecord>;
}

#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<HashMap<RecordKey, CanonicalDayRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AttendanceStore for InMemoryStore {
    fn put(&self, record: CanonicalDayRecord) {
        let key = (record.employee_id.clone(), record.date);
        debug!(employee_id = %key.0, date = %key.1, "Upserting canonical day record");
        self.records.lock().unwrap().insert(key, record);
    }

    fn get(&self, employee_id: &str, date: NaiveDate) -> Option<CanonicalDayRecord> {
        self.records
            .lock()
            .unwrap()
            .get(&(employee_id.to_string(), date))
            .cloned()
    }

    fn range(
        &self,
        employee_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<CanonicalDayRecord> {
        let guard = self.records.lock().unwrap();
        let mut records: Vec<CanonicalDayRecord> = guard
            .values()
            .filter(|r| r.employee_id == employee_id && r.date >= from && r.date <= to)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.date);
        records
    }
}
