use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock instant in nanoseconds since the UNIX epoch.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Clock(u64);

impl Clock {
    pub fn now() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self(u64::try_from(now.as_nanos()).unwrap_or(u64::MAX))
    }

    pub fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    pub fn as_nanos(&self) -> u64 {
        self.0
    }

    pub fn as_secs(&self) -> f64 {
        self.0 as f64 * 1e-9
    }
}
