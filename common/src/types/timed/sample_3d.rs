use crate::constants::N_XYZ_COORDINATES;
use crate::types::events::Readings;
use crate::types::untimed::XYZ;
use crate::FromReadings;

const TIMESTAMP_IDX: usize = 0;
const X_COORD_IDX: usize = 1;

/// A structure representing a 3D sample with a timestamp and measurement.
///
/// The timestamp is expressed in nanoseconds in the time base of the source that
/// produced the sample.
///
/// # Examples
///
/// ```
/// use common::types::timed::Sample3D;
/// use common::types::untimed::XYZ;
///
/// let sample = Sample3D::new(1_000, [1.0, 2.0, 3.0]);
///
/// assert_eq!(sample.get_timestamp(), 1_000);
/// assert_eq!(sample.get_measurement(), XYZ::from([1.0, 2.0, 3.0]));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sample3D {
    timestamp: u64,
    measurement: XYZ,
}

impl Sample3D {
    ///  Creates a new `Sample3D` instance from a timestamp and a measurement array.
    pub fn new(timestamp: u64, measurement: [f64; N_XYZ_COORDINATES]) -> Self {
        Self {
            timestamp,
            measurement: XYZ::new(measurement),
        }
    }

    /// Creates a new `Sample3D` instance from a timestamp and an `XYZ` measurement.
    pub fn from_measurement(timestamp: u64, measurement: XYZ) -> Self {
        Self {
            timestamp,
            measurement,
        }
    }

    pub fn get_measurement(&self) -> XYZ {
        self.measurement
    }

    pub fn get_timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Returns the same measurement stamped with a different timestamp.
    pub fn with_timestamp(&self, timestamp: u64) -> Self {
        Self {
            timestamp,
            measurement: self.measurement,
        }
    }
}

/// Builds a sample from a `[timestamp_secs, x, y, z]` row, as found in recorded traces.
impl TryFrom<Vec<f64>> for Sample3D {
    type Error = &'static str;

    fn try_from(value: Vec<f64>) -> Result<Self, Self::Error> {
        if value.len() != N_XYZ_COORDINATES + 1 {
            return Err("Invalid length of input vector");
        }
        let timestamp = value[TIMESTAMP_IDX];
        if !timestamp.is_finite() || timestamp < 0.0 {
            return Err("Invalid timestamp");
        }
        let measurement = XYZ::try_from(value[X_COORD_IDX..=N_XYZ_COORDINATES].to_vec())?;
        Ok(Sample3D::from_measurement(
            (timestamp * 1e9).round() as u64,
            measurement,
        ))
    }
}

impl FromReadings for Sample3D {
    fn from_readings(readings: &Readings) -> Vec<Self> {
        match readings {
            Readings::Vectors(samples) => samples.clone(),
            Readings::HeartRate(_) => Vec::new(),
        }
    }
}
