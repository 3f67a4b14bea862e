//! Wall-clock NTP-style timestamp formatting for document windows.
//!
//! Per spec §6/§9: wall-clock UTC is the only clock used for document
//! windows; a separate monotonic clock ([`std::time::Instant`]) is used by
//! the exporter for the export-timeout comparison to avoid NTP-skew-induced
//! flushes.

use chrono::{DateTime, Utc};

/// `(start_ntp, start_ntp_float)` pair derived from a wall-clock instant:
/// the millisecond-precision `YYYY-MM-DDTHH:MM:SS.mmmZ` string and the
/// POSIX-seconds float representation.
pub fn ntp_formats(ts: DateTime<Utc>) -> (String, f64) {
    let formatted = ts.format("%Y-%m-%dT%H:%M:%S%.3f").to_string();
    let ntp = format!("{formatted}Z");
    let float = ts.timestamp() as f64 + ts.timestamp_subsec_nanos() as f64 / 1e9;
    (ntp, float)
}

/// Nanosecond presentation timestamp since the Unix epoch.
pub fn ntp_pts(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_nanos_opt().unwrap_or(0)
}

/// Second-precision, space-separated timestamp for the frontend's partial
/// transcript feed (spec §6) — distinct from [`ntp_formats`]'s millisecond
/// `T`-separated document-window timestamps.
pub fn frontend_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}
