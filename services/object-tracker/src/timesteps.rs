//! Time-step enumeration and the naming derived from it.

use chrono::{Duration, NaiveDateTime};
use thiserror::Error;

/// Compact timestamp format used on the command line and in file names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M";

#[derive(Debug, Error, PartialEq)]
pub enum TimeStepError {
    #[error("invalid timestamp '{0}', expected YYYYMMDDHHMM")]
    InvalidTimestamp(String),

    #[error("end {end} is before start {start}")]
    EndBeforeStart {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("step must be positive, got {0} minutes")]
    InvalidStep(i64),
}

/// Parse a `YYYYMMDDHHMM` timestamp.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, TimeStepError> {
    let s = s.trim();
    if s.len() != 12 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimeStepError::InvalidTimestamp(s.to_string()));
    }
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map_err(|_| TimeStepError::InvalidTimestamp(s.to_string()))
}

/// Format a time step the way file names use it.
pub fn format_timestamp(t: NaiveDateTime) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}

/// Every time from `start` to `end` inclusive, `step_minutes` apart.
///
/// `end` is included only if it falls on the step grid.
pub fn generate_time_steps(
    start: NaiveDateTime,
    end: NaiveDateTime,
    step_minutes: i64,
) -> Result<Vec<NaiveDateTime>, TimeStepError> {
    if step_minutes <= 0 {
        return Err(TimeStepError::InvalidStep(step_minutes));
    }
    if end < start {
        return Err(TimeStepError::EndBeforeStart { start, end });
    }

    let step = Duration::minutes(step_minutes);
    let mut times = Vec::new();
    let mut current = start;
    while current <= end {
        times.push(current);
        current += step;
    }
    Ok(times)
}

/// Folder tag for a threshold value: `thr_<value>` with `.` replaced by `p`.
///
/// Values always carry a decimal point, so `1.0` gives `thr_1p0`. Exponent
/// form keeps a sign and two digits, so `1e-5` gives `thr_1e-05`.
pub fn threshold_tag(threshold: f64) -> String {
    format!("thr_{}", shortest_repr(threshold)).replace('.', "p")
}

/// Shortest round-trip text of `value` with a signed, two-digit exponent.
fn shortest_repr(value: f64) -> String {
    let text = format!("{value:?}");
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => text,
    }
}

/// Folder tag for a threshold given as text, as typed on the command line.
///
/// A leading `thr_` is accepted; the rest is used verbatim apart from the
/// `.` → `p` substitution.
pub fn threshold_tag_from_str(threshold: &str) -> String {
    let value = threshold.trim();
    let value = value.strip_prefix("thr_").unwrap_or(value);
    format!("thr_{}", value).replace('.', "p")
}
