use std::{ops::Range, sync::LazyLock};

use chrono::{DateTime, NaiveDateTime};
use regex::Regex;

use crate::{MpdError, MpdResult};

pub const MICROS_PER_SECOND: u64 = 1_000_000;
pub const MILLIS_PER_SECOND: u64 = 1_000;

// xs:duration, e.g. "PT1H2M3.5S" or "P1DT12H".
// Years are counted as 365 days and months as 30 days.
static XS_DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^P(?:([\d.]+)Y)?(?:([\d.]+)M)?(?:([\d.]+)W)?(?:([\d.]+)D)?(?:T(?:([\d.]+)H)?(?:([\d.]+)M)?(?:([\d.]+)S)?)?$",
    )
    .unwrap()
});

const DURATION_UNITS_SECONDS: [f64; 7] = [
    365.0 * 86_400.0,
    30.0 * 86_400.0,
    7.0 * 86_400.0,
    86_400.0,
    3_600.0,
    60.0,
    1.0,
];

/// Parses an `xs:duration` value into milliseconds. Negative durations clamp to zero.
pub fn parse_xs_duration(attribute: &str, value: &str) -> MpdResult<u64> {
    let invalid = || MpdError::attribute(attribute, value);

    let (negative, unsigned) = match value.trim().strip_prefix('-') {
        Some(unsigned) => (true, unsigned),
        None => (false, value.trim()),
    };
    let caps = XS_DURATION_REGEX.captures(unsigned).ok_or_else(invalid)?;
    // At least one component, and at least one after the time designator.
    let matched = |mut groups: Range<usize>| groups.any(|i| caps.get(i).is_some());
    if !matched(1..8) || (unsigned.contains('T') && !matched(5..8)) {
        return Err(invalid());
    }
    let mut seconds = 0f64;
    for (index, unit) in DURATION_UNITS_SECONDS.iter().enumerate() {
        if let Some(amount) = caps.get(index + 1) {
            let amount: f64 = amount.as_str().parse().map_err(|_| invalid())?;
            seconds += amount * unit;
        }
    }

    if negative {
        return Ok(0);
    }
    Ok((seconds * MILLIS_PER_SECOND as f64).round() as u64)
}

/// Parses an `xs:dateTime` value into milliseconds since the unix epoch.
///
/// Values without a timezone are read as UTC.
pub fn parse_xs_date_time(attribute: &str, value: &str) -> MpdResult<i64> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map(|dt| dt.timestamp_millis())
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|dt| dt.and_utc().timestamp_millis())
        })
        .map_err(|_| MpdError::attribute(attribute, value))
}

/// Computes `value * multiplier / divisor` without overflowing the intermediate product.
///
/// `divisor` must be non-zero. Results outside of `i64` saturate.
pub fn scale_large_timestamp(value: i64, multiplier: u64, divisor: u64) -> i64 {
    let scaled = value as i128 * multiplier as i128 / divisor as i128;
    i64::try_from(scaled).unwrap_or(if scaled < 0 { i64::MIN } else { i64::MAX })
}
