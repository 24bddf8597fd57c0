// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! Wall-clock helpers. Engine operations take `now` explicitly; these are for callers.

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds in one day.
pub const MILLIS_PER_DAY: u64 = 24 * 60 * 60 * 1000;

/// Current unix time in milliseconds.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Days since the unix epoch for a millisecond timestamp (UTC).
#[must_use]
pub const fn day_index(millis: u64) -> u64 {
    millis / MILLIS_PER_DAY
}

/// Duration of `days` in milliseconds, saturating.
#[must_use]
#[allow(clippy::cast_lossless)]
pub const fn days_to_millis(days: u32) -> u64 {
    (days as u64).saturating_mul(MILLIS_PER_DAY)
}
