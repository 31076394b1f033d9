//! Spreadsheet day-serial arithmetic.

use chrono::format::{Item, StrftimeItems};
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt::Write;

/// Default rendering of a date cell.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
/// Default rendering of a date cell whose format also shows a time.
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Default rendering of a time cell.
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";

/// Largest serial a worksheet can hold (9999-12-31).
const MAX_SERIAL: f64 = 2_958_465.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Epoch convention of a workbook.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateSystem {
    /// Serial 1 is 1900-01-01, with the fictitious 1900-02-29 counted.
    #[default]
    Epoch1900,
    /// Serial 0 is 1904-01-01.
    Epoch1904,
}

impl DateSystem {
    pub fn from_date1904(date1904: bool) -> Self {
        if date1904 {
            DateSystem::Epoch1904
        } else {
            DateSystem::Epoch1900
        }
    }
}

/// Convert a day serial to a calendar date and time.
///
/// The fractional part is the time of day, rounded to the second. Serials
/// outside the representable range yield `None`.
pub fn serial_to_datetime(serial: f64, system: DateSystem) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial.abs() > MAX_SERIAL {
        return None;
    }

    let mut days = serial.floor() as i64;
    let mut seconds = ((serial - serial.floor()) * SECONDS_PER_DAY).round() as u32;
    if seconds >= SECONDS_PER_DAY as u32 {
        days += 1;
        seconds = 0;
    }

    let (epoch, offset) = match system {
        // Serial 60 is the nonexistent 1900-02-29; from 61 on, dates are
        // one day behind the count and collapse 60 onto 1900-02-28.
        DateSystem::Epoch1900 if days < 60 => (NaiveDate::from_ymd_opt(1899, 12, 31)?, days),
        DateSystem::Epoch1900 => (NaiveDate::from_ymd_opt(1899, 12, 30)?, days),
        DateSystem::Epoch1904 => (NaiveDate::from_ymd_opt(1904, 1, 1)?, days),
    };

    let date = if offset >= 0 {
        epoch.checked_add_days(Days::new(offset as u64))?
    } else {
        epoch.checked_sub_days(Days::new(offset.unsigned_abs()))?
    };
    let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)?;
    Some(date.and_time(time))
}

/// Render a date/time with a strftime pattern; `None` if the pattern cannot
/// be applied.
pub fn format_datetime(value: &NaiveDateTime, pattern: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", value.format(pattern)).ok()?;
    Some(out)
}

/// Whether a strftime pattern is well formed.
pub fn is_valid_pattern(pattern: &str) -> bool {
    StrftimeItems::new(pattern).all(|item| !matches!(item, Item::Error))
}
