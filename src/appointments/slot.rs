//! Date and time-of-day handling for booking slots.
//!
//! A slot is the half-open interval `[start, end)` on a calendar date.
//! Wire format is `YYYY-MM-DD` for dates and `HH:MM` for times; the parser
//! also accepts `HH:MM:SS`.

use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, Time};

use crate::error::ApiError;

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIME_HM: &[FormatItem<'static>] = format_description!("[hour]:[minute]");
const TIME_HMS: &[FormatItem<'static>] = format_description!("[hour]:[minute]:[second]");

pub fn parse_date(field: &str, raw: &str) -> Result<Date, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ApiError::Validation(format!("{field} is required")));
    }
    Date::parse(raw, DATE_FORMAT).map_err(|_| {
        ApiError::Validation(format!("{field} must be a valid date (YYYY-MM-DD)"))
    })
}

pub fn parse_time(field: &str, raw: &str) -> Result<Time, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ApiError::Validation(format!("{field} is required")));
    }
    Time::parse(raw, TIME_HMS)
        .or_else(|_| Time::parse(raw, TIME_HM))
        .map_err(|_| ApiError::Validation(format!("{field} must be a valid time (HH:MM)")))
}

pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Times are emitted as `HH:MM` uniformly; stored seconds are dropped.
pub fn format_time(time: Time) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}
