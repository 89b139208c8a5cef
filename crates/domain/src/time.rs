//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp attached to event-log records.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Render a timestamp the way the events log prints it
/// (`Sun Oct 18 14:03:11 2026`).
#[must_use]
pub fn format_event_time(ts: &Timestamp) -> String {
    ts.format("%a %b %e %H:%M:%S %Y").to_string()
}
