//! The fixed ISO-8601 profile used for timestamps and durations on the wire.
//!
//! Timestamps: `YYYY-MM-DDTHH:MM:SS[.fraction](Z|±HH:MM)`, rendered with
//! millisecond precision and `Z` for a zero offset.
//!
//! Durations: `[-]P[nW][nD][T[nH][nM][n[.fff]S]]`, rendered as
//! `[-]PT{h}H{m}M{s}S` with zero components omitted.

use crate::error::{CodecError, CodecResult};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;

#[allow(clippy::expect_used)]
static TIMESTAMP_ZULU: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})T(\d{2}):(\d{2}):(\d{2})Z$").expect("valid regex")
});

#[allow(clippy::expect_used)]
static TIMESTAMP_ZULU_FRACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})T(\d{2}):(\d{2}):(\d{2})\.(\d+)Z$").expect("valid regex")
});

#[allow(clippy::expect_used)]
static TIMESTAMP_OFFSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})T(\d{2}):(\d{2}):(\d{2})([+-])(\d{2}):(\d{2})$")
        .expect("valid regex")
});

#[allow(clippy::expect_used)]
static TIMESTAMP_OFFSET_FRACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})T(\d{2}):(\d{2}):(\d{2})\.(\d+)([+-])(\d{2}):(\d{2})$")
        .expect("valid regex")
});

#[allow(clippy::expect_used)]
static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(-)?P(?:(\d+)W)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)(?:\.(\d{1,9}))?S)?)?$",
    )
    .expect("valid regex")
});

const MILLIS_PER_SECOND: i64 = 1_000;
const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

struct TimestampParts<'a> {
    date_time: [&'a str; 6],
    fraction: Option<&'a str>,
    /// (sign, hours, minutes); `None` for zulu
    offset: Option<(&'a str, &'a str, &'a str)>,
}

fn group<'t>(caps: &regex::Captures<'t>, i: usize) -> &'t str {
    caps.get(i).map_or("", |m| m.as_str())
}

fn head<'t>(caps: &regex::Captures<'t>) -> [&'t str; 6] {
    [
        group(caps, 1),
        group(caps, 2),
        group(caps, 3),
        group(caps, 4),
        group(caps, 5),
        group(caps, 6),
    ]
}

fn timestamp_parts(text: &str) -> Option<TimestampParts<'_>> {
    if let Some(caps) = TIMESTAMP_ZULU.captures(text) {
        return Some(TimestampParts {
            date_time: head(&caps),
            fraction: None,
            offset: None,
        });
    }
    if let Some(caps) = TIMESTAMP_ZULU_FRACTION.captures(text) {
        return Some(TimestampParts {
            date_time: head(&caps),
            fraction: caps.get(7).map(|m| m.as_str()),
            offset: None,
        });
    }
    if let Some(caps) = TIMESTAMP_OFFSET.captures(text) {
        return Some(TimestampParts {
            date_time: head(&caps),
            fraction: None,
            offset: Some((group(&caps, 7), group(&caps, 8), group(&caps, 9))),
        });
    }
    if let Some(caps) = TIMESTAMP_OFFSET_FRACTION.captures(text) {
        return Some(TimestampParts {
            date_time: head(&caps),
            fraction: caps.get(7).map(|m| m.as_str()),
            offset: Some((group(&caps, 8), group(&caps, 9), group(&caps, 10))),
        });
    }
    None
}

/// Nanoseconds represented by the digits after the decimal point.
fn fraction_nanos(digits: &str) -> Option<u32> {
    let truncated: String = digits.chars().take(9).collect();
    let padded = format!("{:0<9}", truncated);
    padded.parse().ok()
}

/// Parse a timestamp in the wire profile.
///
/// # Errors
///
/// `FormatError` when the text matches none of the accepted shapes or names an
/// impossible date, time or offset.
pub fn parse_timestamp(text: &str) -> CodecResult<DateTime<FixedOffset>> {
    let err = || CodecError::format("datetime", text);
    let parts = timestamp_parts(text).ok_or_else(err)?;

    let mut fields = [0_u32; 6];
    for (slot, raw) in fields.iter_mut().zip(parts.date_time.iter()) {
        *slot = raw.parse().map_err(|_| err())?;
    }
    let [year, month, day, hour, minute, second] = fields;
    let nanos = match parts.fraction {
        Some(digits) => fraction_nanos(digits).ok_or_else(err)?,
        None => 0,
    };

    let offset_seconds = match parts.offset {
        None => 0,
        Some((sign, hh, mm)) => {
            let hours: i32 = hh.parse().map_err(|_| err())?;
            let minutes: i32 = mm.parse().map_err(|_| err())?;
            if minutes >= 60 {
                return Err(err());
            }
            let magnitude = hours * 3600 + minutes * 60;
            if sign == "-" {
                -magnitude
            } else {
                magnitude
            }
        }
    };
    let offset = FixedOffset::east_opt(offset_seconds).ok_or_else(err)?;

    let naive = NaiveDate::from_ymd_opt(year as i32, month, day)
        .and_then(|d| d.and_hms_nano_opt(hour, minute, second, nanos))
        .ok_or_else(err)?;
    offset.from_local_datetime(&naive).single().ok_or_else(err)
}

/// Render a timestamp in the wire profile.
#[must_use]
pub fn format_timestamp(timestamp: &DateTime<FixedOffset>) -> String {
    let base = timestamp.format("%Y-%m-%dT%H:%M:%S%.3f").to_string();
    let offset = timestamp.offset().local_minus_utc();
    if offset == 0 {
        return format!("{}Z", base);
    }
    let sign = if offset < 0 { '-' } else { '+' };
    let minutes = offset.abs() / 60;
    format!("{}{}{:02}:{:02}", base, sign, minutes / 60, minutes % 60)
}

/// Parse a duration in the wire profile.
///
/// # Errors
///
/// `FormatError` for text outside the profile, including year and month
/// components, which have no fixed length.
pub fn parse_duration(text: &str) -> CodecResult<TimeDelta> {
    let err = || CodecError::format("timedelta", text);
    // "P" and "PT" alone carry no component
    if text.ends_with('P') || text.ends_with('T') {
        return Err(err());
    }
    let caps = DURATION.captures(text).ok_or_else(err)?;

    let component = |i: usize, scale: i64| -> CodecResult<i64> {
        match caps.get(i) {
            Some(m) => m
                .as_str()
                .parse::<i64>()
                .ok()
                .and_then(|n| n.checked_mul(scale))
                .ok_or_else(err),
            None => Ok(0),
        }
    };

    let fraction_millis = match caps.get(7) {
        Some(m) => {
            let digits: String = m.as_str().chars().take(3).collect();
            format!("{:0<3}", digits).parse::<i64>().map_err(|_| err())?
        }
        None => 0,
    };

    let mut total: i64 = 0;
    for part in [
        component(2, 7 * MILLIS_PER_DAY)?,
        component(3, MILLIS_PER_DAY)?,
        component(4, MILLIS_PER_HOUR)?,
        component(5, MILLIS_PER_MINUTE)?,
        component(6, MILLIS_PER_SECOND)?,
        fraction_millis,
    ] {
        total = total.checked_add(part).ok_or_else(err)?;
    }
    if caps.get(1).is_some() {
        total = -total;
    }
    TimeDelta::try_milliseconds(total).ok_or_else(err)
}

/// Render a duration in the wire profile (millisecond precision).
#[must_use]
pub fn format_duration(duration: &TimeDelta) -> String {
    let total = duration.num_milliseconds();
    let sign = if total < 0 { "-" } else { "" };
    let mut remaining = total.unsigned_abs();

    let hours = remaining / MILLIS_PER_HOUR as u64;
    remaining %= MILLIS_PER_HOUR as u64;
    let minutes = remaining / MILLIS_PER_MINUTE as u64;
    remaining %= MILLIS_PER_MINUTE as u64;
    let seconds = remaining / MILLIS_PER_SECOND as u64;
    let millis = remaining % MILLIS_PER_SECOND as u64;

    let mut out = format!("{}PT", sign);
    if hours > 0 {
        out.push_str(&format!("{}H", hours));
    }
    if minutes > 0 {
        out.push_str(&format!("{}M", minutes));
    }
    if millis > 0 {
        let fraction = format!("{:03}", millis);
        out.push_str(&format!("{}.{}S", seconds, fraction.trim_end_matches('0')));
    } else if seconds > 0 || (hours == 0 && minutes == 0) {
        out.push_str(&format!("{}S", seconds));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_round_trip_variants() {
        for text in [
            "2014-01-01T23:28:56.782Z",
            "2014-02-01T09:28:56.321-10:00",
            "2014-02-01T09:28:56.321+05:30",
        ] {
            let ts = parse_timestamp(text).unwrap();
            assert_eq!(format_timestamp(&ts), text);
        }
    }

    #[test]
    fn test_timestamp_zero_offset_renders_zulu() {
        let ts = parse_timestamp("2014-02-01T09:28:56.321+00:00").unwrap();
        assert_eq!(format_timestamp(&ts), "2014-02-01T09:28:56.321Z");
    }

    #[test]
    fn test_timestamp_without_fraction() {
        let ts = parse_timestamp("1967-08-12T00:00:00Z").unwrap();
        assert_eq!(format_timestamp(&ts), "1967-08-12T00:00:00.000Z");
    }

    #[test]
    fn test_timestamp_rejects_outside_profile() {
        for text in [
            "1967-08-12",
            "1967-08-12T00:00:00",
            "1967-08-12 00:00:00Z",
            "1967-13-12T00:00:00Z",
            "yesterday",
        ] {
            let err = parse_timestamp(text).unwrap_err();
            assert_eq!(err.kind(), "FormatError", "{}", text);
        }
    }

    #[test]
    fn test_duration_time_only() {
        let d = parse_duration("PT12H11M10S").unwrap();
        assert_eq!(d, TimeDelta::seconds(12 * 3600 + 11 * 60 + 10));
        assert_eq!(format_duration(&d), "PT12H11M10S");
    }

    #[test]
    fn test_duration_negative() {
        let d = parse_duration("-PT10M").unwrap();
        assert_eq!(d, TimeDelta::minutes(-10));
        assert_eq!(format_duration(&d), "-PT10M");
    }

    #[test]
    fn test_duration_days_and_weeks() {
        assert_eq!(parse_duration("P1D").unwrap(), TimeDelta::hours(24));
        assert_eq!(parse_duration("P1WT1H").unwrap(), TimeDelta::hours(7 * 24 + 1));
        assert_eq!(format_duration(&TimeDelta::hours(25)), "PT25H");
    }

    #[test]
    fn test_duration_fraction() {
        let d = parse_duration("PT1.5S").unwrap();
        assert_eq!(d, TimeDelta::milliseconds(1500));
        assert_eq!(format_duration(&d), "PT1.5S");
    }

    #[test]
    fn test_duration_zero() {
        assert_eq!(format_duration(&TimeDelta::zero()), "PT0S");
        assert_eq!(parse_duration("PT0S").unwrap(), TimeDelta::zero());
    }

    #[test]
    fn test_duration_rejects_calendar_components() {
        for text in ["P3Y2M1D", "P1M", "P", "PT", "10 minutes", "PT1H30"] {
            let err = parse_duration(text).unwrap_err();
            assert_eq!(err.kind(), "FormatError", "{}", text);
        }
    }
}
