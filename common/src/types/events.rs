use crate::types::timed::{HeartRateSample, Sample3D};

/// Batch of raw samples delivered by a source for one sensor.
#[derive(Debug, Clone, PartialEq)]
pub enum Readings {
    Vectors(Vec<Sample3D>),
    HeartRate(Vec<HeartRateSample>),
}

impl Readings {
    pub fn len(&self) -> usize {
        match self {
            Readings::Vectors(samples) => samples.len(),
            Readings::HeartRate(samples) => samples.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything a stream subscription can deliver to its listener.
///
/// `Failed` and `Completed` are terminal: no further readings follow on the
/// same subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Readings(Readings),
    Failed(String),
    Completed,
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Readings(_))
    }
}

/// Connection lifecycle and housekeeping notifications from a device.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    Connecting(String),
    Connected(String),
    Disconnected(String),
    BatteryLevel { device_id: String, level: u8 },
    Information {
        device_id: String,
        key: String,
        value: String,
    },
}

impl DeviceEvent {
    pub fn device_id(&self) -> &str {
        match self {
            DeviceEvent::Connecting(id)
            | DeviceEvent::Connected(id)
            | DeviceEvent::Disconnected(id) => id,
            DeviceEvent::BatteryLevel { device_id, .. }
            | DeviceEvent::Information { device_id, .. } => device_id,
        }
    }
}
