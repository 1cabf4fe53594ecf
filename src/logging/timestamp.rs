//! Timestamp rendering for log lines

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a timestamp as ISO-8601 with millisecond precision and a `Z` suffix
///
/// Example: `2026-01-21T14:30:45.123Z`
pub fn timestamp_string(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
