use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use derive_more::Display;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::request::{Request, TimeRange};

/// Longest otgul that can be requested, in minutes.
pub const MAX_DURATION_MINUTES: i64 = 60;

/// Form limits, in characters.
pub const FULL_NAME_MAX_LEN: usize = 50;
pub const STATIC_ID_MAX_LEN: usize = 20;
pub const TIME_TEXT_MAX_LEN: usize = 20;
pub const REASON_MAX_LEN: usize = 200;

static TIME_RANGE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{1,2}):([0-9]{2})\s*-\s*([0-9]{1,2}):([0-9]{2})$")
        .expect("time range pattern must compile")
});

// Older files kept whatever followed the range, e.g. "15:00 - 15:30 (врач)".
static LEADING_TIME_RANGE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([0-9]{1,2}):([0-9]{2})\s*-\s*([0-9]{1,2}):([0-9]{2})")
        .expect("leading time range pattern must compile")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TimeRangeError {
    #[display(fmt = "Неверный формат времени. Используйте: ЧЧ:ММ - ЧЧ:ММ")]
    InvalidFormat,
    #[display(fmt = "Время окончания должно быть позже времени начала")]
    NonPositive,
    #[display(fmt = "Максимальная длительность отгула: 1 час")]
    TooLong,
}

impl std::error::Error for TimeRangeError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FieldError {
    #[display(fmt = "Поле «{}» обязательно для заполнения", _0)]
    Missing(&'static str),
    #[display(fmt = "Поле «{}» не может быть длиннее {} символов", _0, _1)]
    TooLong(&'static str, usize),
}

impl std::error::Error for FieldError {}

/// Non-blank and at most `max_len` characters.
pub fn require_field(label: &'static str, value: &str, max_len: usize) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::Missing(label));
    }
    limit_field(label, value, max_len)
}

pub fn limit_field(label: &'static str, value: &str, max_len: usize) -> Result<(), FieldError> {
    if value.chars().count() > max_len {
        return Err(FieldError::TooLong(label, max_len));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTimeRange {
    pub range: TimeRange,
    pub duration_label: String,
}

/// Reads `H:MM - H:MM` without applying the duration rules.
pub fn split_time_range(text: &str) -> Result<TimeRange, TimeRangeError> {
    let caps = TIME_RANGE_PATTERN
        .captures(text.trim())
        .ok_or(TimeRangeError::InvalidFormat)?;

    Ok(TimeRange {
        start: clock_time(&caps[1], &caps[2])?,
        end: clock_time(&caps[3], &caps[4])?,
    })
}

/// Reads the range at the start of `text`, ignoring anything after it.
/// Used for stored records only; new input goes through `parse_time_range`.
pub fn leading_time_range(text: &str) -> Option<TimeRange> {
    let caps = LEADING_TIME_RANGE_PATTERN.captures(text)?;
    Some(TimeRange {
        start: clock_time(&caps[1], &caps[2]).ok()?,
        end: clock_time(&caps[3], &caps[4]).ok()?,
    })
}

fn clock_time(hours: &str, minutes: &str) -> Result<NaiveTime, TimeRangeError> {
    let hours: u32 = hours.parse().map_err(|_| TimeRangeError::InvalidFormat)?;
    let minutes: u32 = minutes.parse().map_err(|_| TimeRangeError::InvalidFormat)?;
    NaiveTime::from_hms_opt(hours, minutes, 0).ok_or(TimeRangeError::InvalidFormat)
}

/// Parses the requester's time text and enforces `0 < duration <= 60 min`.
pub fn parse_time_range(text: &str) -> Result<ParsedTimeRange, TimeRangeError> {
    let range = split_time_range(text)?;
    let minutes = range.duration().num_minutes();

    if minutes <= 0 {
        return Err(TimeRangeError::NonPositive);
    }
    if minutes > MAX_DURATION_MINUTES {
        return Err(TimeRangeError::TooLong);
    }

    Ok(ParsedTimeRange {
        duration_label: range.duration_label(),
        range,
    })
}

/// True iff `start` today is strictly after `now`. A start time that has
/// already passed is never read as tomorrow.
pub fn is_future_start(start: NaiveTime, now: NaiveDateTime) -> bool {
    now.date().and_time(start) > now
}

pub fn has_pending_today(records: &[Request], requester_id: &str, today: NaiveDate) -> bool {
    records
        .iter()
        .any(|r| r.requester_id == requester_id && r.date == today && r.is_pending())
}
