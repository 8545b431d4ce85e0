//! Wall-clock and monotonic nanosecond timestamps.

use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// 2020-01-01T00:00:00Z in nanoseconds.
pub const MIN_WALL_NS: i64 = 1_577_836_800_000_000_000;
/// 2050-01-01T00:00:00Z in nanoseconds.
pub const MAX_WALL_NS: i64 = 2_524_608_000_000_000_000;

// Monotonic readings are anchored to the wall clock at first use so the
// values are comparable across components within one process.
static ANCHOR: Lazy<(i64, Instant)> = Lazy::new(|| (wall_ns(), Instant::now()));

/// Wall-clock nanoseconds since the Unix epoch.
pub fn wall_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}

/// Monotonic nanoseconds; non-decreasing within a process.
///
/// Use for latency measurement and ordering, never for calendar time.
pub fn monotonic_ns() -> i64 {
    let (base, anchor) = *ANCHOR;
    base + anchor.elapsed().as_nanos() as i64
}

/// Render nanoseconds since the Unix epoch as an ISO 8601 UTC string.
pub fn to_iso8601(ns: i64) -> String {
    DateTime::<Utc>::from_timestamp(ns.div_euclid(1_000_000_000), ns.rem_euclid(1_000_000_000) as u32)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Nanos, true))
        .unwrap_or_default()
}

/// Parse an ISO 8601 string to nanoseconds since the Unix epoch; 0 on failure.
pub fn from_iso8601(iso: &str) -> i64 {
    DateTime::parse_from_rfc3339(iso)
        .ok()
        .and_then(|dt| dt.timestamp_nanos_opt())
        .unwrap_or(0)
}

/// Whether a wall-clock timestamp falls within the plausible ingest window.
pub fn is_valid_wall(ts_ns: i64) -> bool {
    (MIN_WALL_NS..=MAX_WALL_NS).contains(&ts_ns)
}
