//! Field-range and enum checks shared by the record and vital sign writers.
//!
//! Every check rejects out-of-range values with [`AppError::InvalidInput`];
//! nothing is clamped.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::constants::*;
use crate::error::{AppError, Result};
use crate::models::TimeOfDay;

fn invalid(msg: &str) -> AppError {
    AppError::InvalidInput(msg.to_string())
}

fn check_range<T: PartialOrd + Copy>(value: Option<T>, (lo, hi): (T, T), msg: &str) -> Result<()> {
    match value {
        Some(v) if v < lo || v > hi => Err(invalid(msg)),
        _ => Ok(()),
    }
}

/// Validate the daily metrics of a health record
pub fn validate_daily_metrics(
    weight: Option<f64>,
    steps: Option<i32>,
    sleep_hours: Option<f64>,
) -> Result<()> {
    if let Some(w) = weight {
        if w <= 0.0 || !w.is_finite() {
            return Err(invalid(ERR_WEIGHT_NOT_POSITIVE));
        }
    }
    if let Some(s) = steps {
        if s < 0 {
            return Err(invalid(ERR_STEPS_NEGATIVE));
        }
    }
    check_range(sleep_hours, SLEEP_HOURS_RANGE, ERR_SLEEP_HOURS_RANGE)
}

/// Validate the numeric measurements of a vital sign
pub fn validate_measurements(
    heart_rate: Option<i32>,
    systolic: Option<i32>,
    diastolic: Option<i32>,
    oxygen_saturation: Option<i32>,
) -> Result<()> {
    check_range(heart_rate, HEART_RATE_RANGE, ERR_HEART_RATE_RANGE)?;
    check_range(systolic, SYSTOLIC_RANGE, ERR_SYSTOLIC_RANGE)?;
    check_range(diastolic, DIASTOLIC_RANGE, ERR_DIASTOLIC_RANGE)?;
    check_range(
        oxygen_saturation,
        OXYGEN_SATURATION_RANGE,
        ERR_OXYGEN_SATURATION_RANGE,
    )
}

/// Parse a time-of-day bucket; missing or unknown values are rejected
pub fn parse_time_of_day(raw: Option<&str>) -> Result<TimeOfDay> {
    raw.and_then(TimeOfDay::parse)
        .ok_or_else(|| invalid(ERR_TIME_OF_DAY))
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC)
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Resolve an optional client-supplied date, defaulting to `now`
pub fn resolve_datetime(raw: Option<&str>, field: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    match raw {
        None => Ok(now),
        Some(s) => parse_datetime(s).ok_or_else(|| {
            AppError::InvalidInput(format!(
                "{} must be an RFC 3339 timestamp or a YYYY-MM-DD date",
                field
            ))
        }),
    }
}
