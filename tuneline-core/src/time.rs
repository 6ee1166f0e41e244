//! Time and duration conversion utilities.
//!
//! Positions travel through the core as plain millisecond counts; these
//! helpers convert engine-side `Duration`s without truncation surprises and
//! format positions for display.

use std::time::Duration;

/// Extension trait for safe Duration conversions.
pub trait DurationExt {
    /// Convert duration to milliseconds as u64, saturating at `u64::MAX`.
    ///
    /// In practice, this is always safe because durations exceeding `u64::MAX`
    /// milliseconds would represent ~584 million years.
    fn as_millis_u64(&self) -> u64;
}

impl DurationExt for Duration {
    fn as_millis_u64(&self) -> u64 {
        u64::try_from(self.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Format a millisecond position as `mm:ss`.
///
/// Minutes are not wrapped into hours, so a 75 minute position renders as `75:00`.
#[must_use]
pub fn format_clock(position_ms: u64) -> String {
    let total_secs = position_ms / 1000;
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

/// Parse a user-supplied position: either `mm:ss`, `mm:ss.fff`, or a bare millisecond count.
#[must_use]
pub fn parse_clock(input: &str) -> Option<u64> {
    let input = input.trim();
    let Some((minutes, seconds)) = input.split_once(':') else {
        return input.parse().ok();
    };

    let minutes: u64 = minutes.parse().ok()?;
    let (seconds, millis) = match seconds.split_once('.') {
        Some((secs, frac)) => (secs.parse::<u64>().ok()?, crate::lyrics::fraction_to_millis(frac)?),
        None => (seconds.parse::<u64>().ok()?, 0),
    };

    minutes
        .checked_mul(60_000)?
        .checked_add(seconds.checked_mul(1000)?)?
        .checked_add(millis)
}
