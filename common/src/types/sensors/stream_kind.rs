use std::fmt;

use crate::constants::INTERNAL_DEVICE_ID;
use crate::types::sensors::SensorKind;

/// The four streams a sensor hub manages.
///
/// The declaration order is the priority order used when several streams
/// update at once: heart rate first, then gyroscope, external elevation and
/// internal elevation.
///
/// # Examples
///
/// ```
/// use common::types::sensors::StreamKind;
///
/// let kind = StreamKind::try_from("external-elevation").unwrap();
/// assert_eq!(kind, StreamKind::ExternalElevation);
/// assert!(StreamKind::HeartRate < StreamKind::Gyroscope);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StreamKind {
    HeartRate,
    Gyroscope,
    ExternalElevation,
    InternalElevation,
}

impl StreamKind {
    pub const ALL: [StreamKind; 4] = [
        StreamKind::HeartRate,
        StreamKind::Gyroscope,
        StreamKind::ExternalElevation,
        StreamKind::InternalElevation,
    ];

    /// Raw sensor the stream is derived from.
    pub fn sensor(&self) -> SensorKind {
        match self {
            StreamKind::HeartRate => SensorKind::HeartRate,
            StreamKind::Gyroscope => SensorKind::Gyroscope,
            StreamKind::ExternalElevation | StreamKind::InternalElevation => {
                SensorKind::Accelerometer
            }
        }
    }

    /// True for streams read from the external strap rather than the phone.
    pub fn is_external(&self) -> bool {
        matches!(self, StreamKind::HeartRate | StreamKind::ExternalElevation)
    }

    /// Device the stream is read from when it does not depend on a paired device.
    pub fn fixed_device(&self) -> Option<&'static str> {
        if self.is_external() {
            None
        } else {
            Some(INTERNAL_DEVICE_ID)
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamKind::HeartRate => "heart-rate",
            StreamKind::Gyroscope => "gyroscope",
            StreamKind::ExternalElevation => "external-elevation",
            StreamKind::InternalElevation => "internal-elevation",
        };
        f.write_str(name)
    }
}

impl TryFrom<&str> for StreamKind {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower_case_value = value.to_lowercase().replace('_', "-");
        match lower_case_value.as_str() {
            "heart-rate" | "hr" => Ok(Self::HeartRate),
            "gyroscope" | "gyro" => Ok(Self::Gyroscope),
            "external-elevation" | "external" => Ok(Self::ExternalElevation),
            "internal-elevation" | "internal" => Ok(Self::InternalElevation),
            _ => Err(format!("Unknown stream `{}`", value)),
        }
    }
}
