use crate::types::events::Readings;
use crate::FromReadings;

/// Heart rate in beats per minute, as reported by the strap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeartRateSample {
    bpm: u32,
    timestamp: u64,
}

impl HeartRateSample {
    pub fn new(bpm: u32, timestamp: u64) -> Self {
        Self { bpm, timestamp }
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn get_timestamp(&self) -> u64 {
        self.timestamp
    }
}

impl FromReadings for HeartRateSample {
    fn from_readings(readings: &Readings) -> Vec<Self> {
        match readings {
            Readings::HeartRate(samples) => samples.clone(),
            Readings::Vectors(_) => Vec::new(),
        }
    }
}
