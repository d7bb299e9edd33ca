use chrono::{Duration, NaiveDate, NaiveDateTime};

use common::constants::NANOS_PER_MILLI;

const CLOCK_TIME_FORMAT: &str = "%H:%M:%S%.3f";

/// Textual rendering of a sample timestamp given in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    /// Time of day `HH:MM:SS.mmm`, for timestamps counted from 2000-01-01T00:00:00
    /// (the external strap's epoch).
    ClockTime,
    /// Whole milliseconds since the UNIX epoch.
    EpochMillis,
}

impl TimestampFormat {
    pub fn render(&self, timestamp_nanos: u64) -> String {
        match self {
            TimestampFormat::ClockTime => clock_time(timestamp_nanos),
            TimestampFormat::EpochMillis => (timestamp_nanos / NANOS_PER_MILLI).to_string(),
        }
    }
}

fn sensor_epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(2000, 1, 1)?.and_hms_opt(0, 0, 0)
}

fn clock_time(timestamp_nanos: u64) -> String {
    let nanos = i64::try_from(timestamp_nanos).unwrap_or(i64::MAX);
    sensor_epoch()
        .and_then(|epoch| epoch.checked_add_signed(Duration::nanoseconds(nanos)))
        .map(|instant| instant.format(CLOCK_TIME_FORMAT).to_string())
        .unwrap_or_else(|| {
            log::warn!("timestamp {} out of range", timestamp_nanos);
            timestamp_nanos.to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::constants::NANOS_PER_SECOND;

    #[test]
    fn test_clock_time_at_epoch() {
        assert_eq!(TimestampFormat::ClockTime.render(0), "00:00:00.000");
    }

    #[test]
    fn test_clock_time_millis() {
        let nanos = NANOS_PER_SECOND + 50 * NANOS_PER_MILLI + 999;
        assert_eq!(TimestampFormat::ClockTime.render(nanos), "00:00:01.050");
    }

    #[test]
    fn test_clock_time_wraps_days() {
        let one_day = 24 * 3600 * NANOS_PER_SECOND;
        let nanos = 800 * one_day + (13 * 3600 + 7 * 60 + 42) * NANOS_PER_SECOND;
        assert_eq!(TimestampFormat::ClockTime.render(nanos), "13:07:42.000");
    }

    #[test]
    fn test_epoch_millis() {
        assert_eq!(
            TimestampFormat::EpochMillis.render(1_700_000_000_123_456_789),
            "1700000000123"
        );
        assert_eq!(TimestampFormat::EpochMillis.render(999_999), "0");
    }
}
