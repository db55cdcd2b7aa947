// src/time_parse.rs
//
// Normalizes the heterogeneous time representations found in device exports
// (clock strings, spreadsheet serial dates, native timestamps) into
// minutes-since-midnight. Callers tag the representation explicitly; there is
// no runtime type sniffing here.

use chrono::{NaiveDateTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

const MINUTES_PER_DAY: u32 = 24 * 60;
const MS_PER_DAY: f64 = 86_400_000.0;
const MS_PER_MINUTE: f64 = 60_000.0;

/// A raw time value as captured by an upstream source, tagged with its
/// representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TimeInput {
    /// Clock string: "HH:MM", "HH:MM:SS" or "H:MM AM/PM".
    Text(String),
    /// Excel serial date: fractional days since 1899-12-30.
    ExcelSerial(f64),
    /// Already-parsed timestamp; only the time-of-day part is used.
    Timestamp(NaiveDateTime),
}

// "9:05", "09:05:30", "9:05 PM" etc. Meridiem is optional and case-insensitive.
static CLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?\s*([AaPp][Mm])?$").expect("clock regex")
});

/// Parses a tagged time value into minutes since midnight.
///
/// Returns `None` on anything unparseable — never panics. The result is
/// always in `0..1440`; any day-crossing adjustment happens downstream.
pub fn parse_to_minutes(input: &TimeInput) -> Option<u32> {
    match input {
        TimeInput::Text(raw) => parse_clock_text(raw),
        TimeInput::ExcelSerial(serial) => parse_excel_serial(*serial),
        TimeInput::Timestamp(ts) => Some(ts.time().num_seconds_from_midnight() / 60),
    }
}

fn parse_clock_text(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if let Some(caps) = CLOCK_RE.captures(trimmed) {
        let mut hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minute: u32 = caps.get(2)?.as_str().parse().ok()?;
        if minute > 59 {
            return None;
        }
        // Seconds are accepted but discarded.
        if let Some(sec) = caps.get(3) {
            let sec: u32 = sec.as_str().parse().ok()?;
            if sec > 59 {
                return None;
            }
        }
        match caps.get(4).map(|m| m.as_str().to_ascii_uppercase()) {
            Some(meridiem) => {
                if hour == 0 || hour > 12 {
                    return None;
                }
                if meridiem == "PM" && hour != 12 {
                    hour += 12;
                } else if meridiem == "AM" && hour == 12 {
                    hour = 0;
                }
            }
            None => {
                if hour > 23 {
                    return None;
                }
            }
        }
        return Some(hour * 60 + minute);
    }

    // Full datetime strings occasionally show up in device exports; take the
    // time-of-day part.
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt.time().num_seconds_from_midnight() / 60);
        }
    }
    None
}

fn parse_excel_serial(serial: f64) -> Option<u32> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    // Serial dates count days since 1899-12-30; the calendar part is
    // irrelevant for minutes-within-day, so reduce modulo one day of ms.
    let ms = serial * MS_PER_DAY;
    let ms_in_day = ms % MS_PER_DAY;
    let minutes = (ms_in_day / MS_PER_MINUTE).floor() as u32;
    Some(minutes % MINUTES_PER_DAY)
}

/// Formats minutes-since-midnight as "HH:MM" for reports. Values past
/// midnight (>= 1440) wrap around to the clock face.
pub fn minutes_to_hhmm(minutes: u32) -> String {
    let m = minutes % MINUTES_PER_DAY;
    format!("{:02}:{:02}", m / 60, m % 60)
}
