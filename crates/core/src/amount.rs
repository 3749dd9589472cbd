//! Amount and timestamp formatting
//!
//! Wallet amounts travel in atomic units. Display divides by [`ATOMIC_SCALE`].
//! The scale is the one the shell has always used; it is not derived from the
//! coin's real precision.

use chrono::{DateTime, Local, TimeZone, Utc};
use std::fmt::Display;

/// Atomic units per displayed unit
pub const ATOMIC_SCALE: i64 = 100;

/// Convert atomic units to a human amount (raw quotient, no formatting)
pub fn atomic_to_human(atomic: i64) -> f64 {
    atomic as f64 / ATOMIC_SCALE as f64
}

/// Render atomic units with exactly two decimals and `,` thousands separators
pub fn atomic_to_human_pretty(atomic: i64) -> String {
    let scale = ATOMIC_SCALE.unsigned_abs();
    let magnitude = atomic.unsigned_abs();
    let sign = if atomic < 0 { "-" } else { "" };
    let fixed = format!("{}{}.{:02}", sign, magnitude / scale, magnitude % scale);
    format_like_currency(&fixed)
}

/// Convert a human amount to atomic units
pub fn human_to_atomic(human: f64) -> i64 {
    (human * ATOMIC_SCALE as f64).round() as i64
}

/// Insert `,` every three digits in the integer part of a decimal string
pub fn format_like_currency(amount: &str) -> String {
    let (integer, fraction) = match amount.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (amount, None),
    };
    let (sign, digits) = match integer.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", integer),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match fraction {
        Some(fraction) => format!("{sign}{grouped}.{fraction}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Render epoch seconds as `YYYY-MM-DD HH:MM` in local time.
///
/// `0` means "unconfirmed" to callers; this function does not special-case it.
pub fn convert_timestamp(epoch_seconds: u64) -> String {
    convert_timestamp_in(&Local, epoch_seconds)
}

/// Same as [`convert_timestamp`] in an explicit time zone
pub fn convert_timestamp_in<Tz>(tz: &Tz, epoch_seconds: u64) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let Ok(seconds) = i64::try_from(epoch_seconds) else {
        return String::new();
    };
    match DateTime::<Utc>::from_timestamp(seconds, 0) {
        Some(utc) => utc.with_timezone(tz).format("%Y-%m-%d %H:%M").to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_atomic_to_human_raw_quotient() {
        assert_eq!(atomic_to_human(12345), 123.45);
        assert_eq!(atomic_to_human(-50), -0.5);
        assert_eq!(atomic_to_human(0), 0.0);
    }

    #[test]
    fn test_pretty_has_two_decimals_and_separators() {
        assert_eq!(atomic_to_human_pretty(0), "0.00");
        assert_eq!(atomic_to_human_pretty(5), "0.05");
        assert_eq!(atomic_to_human_pretty(100), "1.00");
        assert_eq!(atomic_to_human_pretty(123_456_789), "1,234,567.89");
        assert_eq!(atomic_to_human_pretty(-1_234_567), "-12,345.67");
        assert_eq!(atomic_to_human_pretty(-5), "-0.05");
    }

    #[test]
    fn test_round_trip_for_integers() {
        for x in [-1_000_000i64, -1, 0, 1, 7, 42, 1_000_000, 9_007_199] {
            assert_eq!(atomic_to_human(human_to_atomic(x as f64)), x as f64);
        }
    }

    #[test]
    fn test_human_to_atomic_scales_by_100() {
        assert_eq!(human_to_atomic(1.5), 150);
        assert_eq!(human_to_atomic(-0.01), -1);
    }

    #[test]
    fn test_format_like_currency() {
        assert_eq!(format_like_currency("1234567.5"), "1,234,567.5");
        assert_eq!(format_like_currency("999"), "999");
        assert_eq!(format_like_currency("1000"), "1,000");
        assert_eq!(format_like_currency("-100000.00"), "-100,000.00");
    }

    #[test]
    fn test_convert_timestamp_utc() {
        assert_eq!(convert_timestamp_in(&Utc, 1_361_205_300), "2013-02-18 16:35");
        assert_eq!(convert_timestamp_in(&Utc, 0), "1970-01-01 00:00");
    }

    #[test]
    fn test_convert_timestamp_with_offset() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(convert_timestamp_in(&offset, 1_361_205_300), "2013-02-18 18:35");
    }

    #[test]
    fn test_convert_timestamp_local_shape() {
        let rendered = convert_timestamp(1_600_000_000);
        assert_eq!(rendered.len(), "YYYY-MM-DD HH:MM".len());
        assert_eq!(&rendered[4..5], "-");
        assert_eq!(&rendered[10..11], " ");
    }
}
