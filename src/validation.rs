//! Input validation for externally supplied records
//!
//! Everything here runs before the store is touched. A failure rejects the
//! single record (or import row) it belongs to.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::model::DEFAULT_FREQUENCY;

/// Naive layouts accepted for a schedule time, tried in order
const NAIVE_DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A malformed field on an incoming record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The primary key is missing
    EmptyAlertName,

    /// Frequency is not an integer
    InvalidFrequency(String),

    /// Frequency is an integer below one minute
    FrequencyTooLow(i64),

    /// Schedule time is not a full date-time
    InvalidScheduleTime(String),

    /// Check time is present but unparseable
    InvalidCheckTime(String),

    /// Status is neither UP nor DOWN
    InvalidStatus(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyAlertName => write!(f, "alert name must not be empty"),
            ValidationError::InvalidFrequency(raw) => {
                write!(f, "frequency must be a number, got '{}'", raw)
            }
            ValidationError::FrequencyTooLow(value) => {
                write!(f, "frequency must be at least 1 minute, got {}", value)
            }
            ValidationError::InvalidScheduleTime(raw) => {
                write!(f, "invalid schedule time '{}', use ISO format", raw)
            }
            ValidationError::InvalidCheckTime(raw) => write!(f, "invalid check time '{}'", raw),
            ValidationError::InvalidStatus(raw) => {
                write!(f, "status must be UP or DOWN, got '{}'", raw)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_alert_name(alert_name: &str) -> Result<(), ValidationError> {
    if alert_name.trim().is_empty() {
        return Err(ValidationError::EmptyAlertName);
    }
    Ok(())
}

pub fn validate_frequency(frequency: u32) -> Result<(), ValidationError> {
    if frequency < 1 {
        return Err(ValidationError::FrequencyTooLow(frequency as i64));
    }
    Ok(())
}

/// Parse a frequency in minutes; an empty value means the default
pub fn parse_frequency(raw: &str) -> Result<u32, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(DEFAULT_FREQUENCY);
    }

    let value: i64 = raw
        .parse()
        .map_err(|_| ValidationError::InvalidFrequency(raw.to_string()))?;

    if value < 1 {
        return Err(ValidationError::FrequencyTooLow(value));
    }

    u32::try_from(value).map_err(|_| ValidationError::InvalidFrequency(raw.to_string()))
}

/// Parse a schedule time into a wall-clock date-time
///
/// Accepts RFC 3339 (the offset is dropped, local wall time kept), ISO
/// date-times with `T` or a space as separator, optional seconds and
/// fractions, and a bare date (midnight).
pub fn parse_schedule_time(raw: &str) -> Result<NaiveDateTime, ValidationError> {
    let raw = raw.trim();
    let invalid = || ValidationError::InvalidScheduleTime(raw.to_string());

    if raw.is_empty() {
        return Err(invalid());
    }

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Ok(with_offset.naive_local());
    }

    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(parsed);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(invalid)
}

/// Parse an optional check time; naive values are taken as UTC
pub fn parse_check_time(raw: &str) -> Result<Option<DateTime<Utc>>, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(with_offset.with_timezone(&Utc)));
    }

    parse_schedule_time(raw)
        .map(|naive| Some(naive.and_utc()))
        .map_err(|_| ValidationError::InvalidCheckTime(raw.to_string()))
}
