use std::time::Duration;

/// Seconds between 1970-01-01 and 2000-01-01, the external strap's epoch.
pub(crate) const SENSOR_EPOCH_OFFSET_SECS: u64 = 946_684_800;

pub(crate) const STANDARD_GRAVITY: f64 = 9.81;

pub(crate) const DEFAULT_POLL_PERIOD: Duration = Duration::from_millis(100);
