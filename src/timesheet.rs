use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::TimeEntry;

/// The four badge events of a working day, in the order they must happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    ClockIn,
    LunchStart,
    LunchEnd,
    ClockOut,
}

pub const RECORD_SEQUENCE: [RecordType; 4] = [
    RecordType::ClockIn,
    RecordType::LunchStart,
    RecordType::LunchEnd,
    RecordType::ClockOut,
];

impl RecordType {
    pub fn label(&self) -> &'static str {
        match self {
            RecordType::ClockIn => "Clock-in",
            RecordType::LunchStart => "Lunch out",
            RecordType::LunchEnd => "Back from lunch",
            RecordType::ClockOut => "Clock-out",
        }
    }
}

/// First slot of the daily sequence not yet recorded, or `None` once the day
/// is complete.
pub fn next_record_type(recorded: &[RecordType]) -> Option<RecordType> {
    RECORD_SEQUENCE
        .iter()
        .copied()
        .find(|t| !recorded.contains(t))
}

/// Record types one employee has badged today, in local calendar-day terms.
pub fn recorded_today(entries: &[TimeEntry], employee_id: &str, now: DateTime<Utc>) -> Vec<RecordType> {
    let today = now.with_timezone(&Local).date_naive();
    entries
        .iter()
        .filter(|e| {
            e.employee_id == employee_id
                && e.timestamp.with_timezone(&Local).date_naive() == today
        })
        .map(|e| e.record_type)
        .collect()
}
