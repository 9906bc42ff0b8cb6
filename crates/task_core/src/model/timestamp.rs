//! Local, zone-less timestamps as they appear in the task file.
//!
//! The written form is `YYYY-MM-DDTHH:MM`, extended with `:SS` when seconds or
//! nanoseconds are set, and with a 3, 6 or 9 digit fraction when nanoseconds
//! are set. Parsing accepts all of those shapes, with 1 to 9 fraction digits.

use crate::error::AppError;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub type Timestamp = PrimitiveDateTime;

/// Current local wall-clock time. Falls back to UTC when the local offset
/// cannot be determined.
pub fn now() -> Timestamp {
    let offset = UtcOffset::current_local_offset().unwrap_or_else(|_| {
        tracing::debug!("local offset unavailable, using UTC");
        UtcOffset::UTC
    });
    let now = OffsetDateTime::now_utc().to_offset(offset);
    PrimitiveDateTime::new(now.date(), now.time())
}

pub fn format_timestamp(value: Timestamp) -> Result<String, AppError> {
    let nanos = value.nanosecond();
    let formatted = if nanos == 0 && value.second() == 0 {
        value.format(format_description!("[year]-[month]-[day]T[hour]:[minute]"))
    } else if nanos == 0 {
        value.format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second]"
        ))
    } else if nanos % 1_000_000 == 0 {
        value.format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]"
        ))
    } else if nanos % 1_000 == 0 {
        value.format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]"
        ))
    } else {
        value.format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]"
        ))
    };

    formatted.map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn parse_timestamp(raw: &str) -> Result<Timestamp, AppError> {
    let trimmed = raw.trim();

    PrimitiveDateTime::parse(
        trimmed,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    )
    .or_else(|_| {
        PrimitiveDateTime::parse(
            trimmed,
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        )
    })
    .or_else(|_| {
        PrimitiveDateTime::parse(
            trimmed,
            format_description!("[year]-[month]-[day]T[hour]:[minute]"),
        )
    })
    .map_err(|err| AppError::invalid_data(format!("invalid timestamp '{trimmed}': {err}")))
}
