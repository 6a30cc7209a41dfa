//! Numeric timestamp classification.
//!
//! Chromium databases mix three epoch families in numeric columns:
//! Windows FILETIME-style microseconds counted from 1601, Unix
//! milliseconds, and Unix seconds. Magnitude decides the family —
//! thresholds are strict, so a value exactly on a boundary falls
//! through to the next bucket. Small numbers (flags, counters, ids)
//! pass through untouched, as does anything whose conversion lands
//! outside the representable calendar.

use chrono::{DateTime, Utc};
use serde_json::{Number, Value};

/// Microseconds between 1601-01-01 and 1970-01-01.
const FILETIME_UNIX_DELTA_MICROS: i64 = 11_644_473_600_000_000;

/// Smallest value read as Unix milliseconds (exclusive).
const UNIX_MILLIS_FLOOR: i64 = 1_000_000_000_000;

/// Smallest value read as Unix seconds (exclusive).
const UNIX_SECONDS_FLOOR: i64 = 1_000_000_000;

/// Latest convertible instant: 9999-12-31T23:59:59Z. Conversions past
/// the four-digit-year ceiling fall back to the raw number.
const MAX_TIMESTAMP_SECS: i64 = 253_402_300_799;

/// Normalize an integer cell: an RFC 3339 UTC string if it classifies
/// as a timestamp, the number itself otherwise.
pub fn normalize_integer(n: i64) -> Value {
    match integer_to_datetime(n) {
        Some(dt) => Value::String(dt.to_rfc3339()),
        None => Value::Number(Number::from(n)),
    }
}

/// Normalize a real cell with the same thresholds.
pub fn normalize_real(f: f64) -> Value {
    if f.is_finite() {
        if let Some(dt) = real_to_datetime(f) {
            return Value::String(dt.to_rfc3339());
        }
    }
    match Number::from_f64(f) {
        Some(n) => Value::Number(n),
        // NaN and infinities have no JSON number form.
        None => Value::String(f.to_string()),
    }
}

fn integer_to_datetime(n: i64) -> Option<DateTime<Utc>> {
    if n > FILETIME_UNIX_DELTA_MICROS {
        in_range(DateTime::from_timestamp_micros(n - FILETIME_UNIX_DELTA_MICROS))
    } else if n > UNIX_MILLIS_FLOOR {
        in_range(DateTime::from_timestamp_millis(n))
    } else if n > UNIX_SECONDS_FLOOR {
        in_range(DateTime::from_timestamp(n, 0))
    } else {
        None
    }
}

fn real_to_datetime(f: f64) -> Option<DateTime<Utc>> {
    if f > FILETIME_UNIX_DELTA_MICROS as f64 {
        in_range(DateTime::from_timestamp_micros(f as i64 - FILETIME_UNIX_DELTA_MICROS))
    } else if f > UNIX_MILLIS_FLOOR as f64 {
        in_range(DateTime::from_timestamp_millis(f as i64))
    } else if f > UNIX_SECONDS_FLOOR as f64 {
        in_range(DateTime::from_timestamp_millis((f * 1000.0) as i64))
    } else {
        None
    }
}

fn in_range(dt: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    dt.filter(|dt| dt.timestamp() <= MAX_TIMESTAMP_SECS)
}
