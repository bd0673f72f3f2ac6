//! Shared utility functions for timestamps and fixed-point formatting.

use std::sync::OnceLock;
use std::time::Instant;
use thiserror::Error;

static ENGINE_EPOCH: OnceLock<Instant> = OnceLock::new();

/// Returns a monotonic engine-local timestamp in nanoseconds.
///
/// The clock is anchored at the first call within the process and is never
/// derived from the wall clock, so it can be used for event ordering even
/// when the system clock steps backwards.
#[must_use]
pub fn monotonic_nanos() -> u64 {
    let epoch = ENGINE_EPOCH.get_or_init(Instant::now);
    epoch.elapsed().as_nanos() as u64
}

/// Error returned when a decimal string cannot be parsed into scaled
/// fixed-point units.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FixedPointError {
    /// The input was empty or contained non-digit characters.
    #[error("malformed decimal string: {0:?}")]
    Malformed(String),

    /// The input had more fractional digits than the scale allows.
    #[error("too many decimal places in {value:?}: scale is {scale}")]
    ScaleOverflow {
        /// The offending input string.
        value: String,
        /// The maximum number of fractional digits.
        scale: u32,
    },
}

/// Formats a scaled fixed-point integer as a decimal string.
///
/// `scale` is the number of fractional digits: `format_fixed(10_000, 2)`
/// yields `"100.00"`, `format_fixed(1_500, 3)` yields `"1.500"`.
#[must_use]
pub fn format_fixed(value: u128, scale: u32) -> String {
    if scale == 0 {
        return value.to_string();
    }
    let divisor = 10u128.pow(scale);
    let whole = value / divisor;
    let frac = value % divisor;
    format!("{whole}.{frac:0width$}", width = scale as usize)
}

/// Parses a decimal string into scaled fixed-point units.
///
/// The inverse of [`format_fixed`]: `parse_fixed("100.00", 2)` yields
/// `10_000`. Trailing fractional digits beyond `scale` are rejected rather
/// than silently rounded.
///
/// # Errors
///
/// Returns [`FixedPointError`] when the input is not a plain non-negative
/// decimal number or carries more fractional digits than `scale`.
pub fn parse_fixed(input: &str, scale: u32) -> Result<u128, FixedPointError> {
    let malformed = || FixedPointError::Malformed(input.to_string());

    let (whole, frac) = match input.split_once('.') {
        Some((w, f)) => (w, f),
        None => (input, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(malformed());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(malformed());
    }
    if frac.len() > scale as usize {
        return Err(FixedPointError::ScaleOverflow {
            value: input.to_string(),
            scale,
        });
    }

    let whole_part: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| malformed())?
    };
    let mut frac_part: u128 = if frac.is_empty() {
        0
    } else {
        frac.parse().map_err(|_| malformed())?
    };
    frac_part *= 10u128.pow(scale - frac.len() as u32);

    whole_part
        .checked_mul(10u128.pow(scale))
        .and_then(|v| v.checked_add(frac_part))
        .ok_or_else(malformed)
}

/// Formats a fee rate in basis points as a decimal rate string.
///
/// One basis point is 0.0001, so `format_bps(10)` yields `"0.0010"` and
/// `format_bps(-2)` yields `"-0.0002"`.
#[must_use]
pub fn format_bps(bps: i32) -> String {
    let sign = if bps < 0 { "-" } else { "" };
    let abs = bps.unsigned_abs() as u128;
    format!("{sign}{}", format_fixed(abs, 4))
}
