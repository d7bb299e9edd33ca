use log::debug;

use common::{ElevationSample, HeartRateSample, Sample3D, SampleProcessor};

use crate::errors::ElevationError;
use crate::filter::{angle_from_vector, Ewma};
use crate::timestamp::TimestampFormat;

/// Raw acceleration to smoothed elevation angle.
#[derive(Debug, Clone)]
pub struct ElevationProcessor {
    ewma: Ewma,
    timestamp_format: TimestampFormat,
}

impl ElevationProcessor {
    pub fn new(alpha: f64, timestamp_format: TimestampFormat) -> Result<Self, ElevationError> {
        Ok(Self {
            ewma: Ewma::new(alpha)?,
            timestamp_format,
        })
    }

    pub fn timestamp_format(&self) -> TimestampFormat {
        self.timestamp_format
    }
}

impl SampleProcessor for ElevationProcessor {
    type Input = Sample3D;
    type Output = ElevationSample;

    fn reset(&mut self) {
        self.ewma.reset();
    }

    fn process(&mut self, input: &Sample3D) -> ElevationSample {
        let angle = angle_from_vector(&input.get_measurement());
        let filtered = self.ewma.update(angle);
        debug!("Filtered elevation: {:.1}", filtered);
        ElevationSample::new(
            filtered,
            self.timestamp_format.render(input.get_timestamp()),
        )
    }
}

/// Heart rate samples are published as received.
#[derive(Debug, Clone, Default)]
pub struct HeartRateProcessor;

impl SampleProcessor for HeartRateProcessor {
    type Input = HeartRateSample;
    type Output = HeartRateSample;

    fn reset(&mut self) {}

    fn process(&mut self, input: &HeartRateSample) -> HeartRateSample {
        *input
    }
}

/// Angular velocity samples are published as received.
#[derive(Debug, Clone, Default)]
pub struct GyroscopeProcessor;

impl SampleProcessor for GyroscopeProcessor {
    type Input = Sample3D;
    type Output = Sample3D;

    fn reset(&mut self) {}

    fn process(&mut self, input: &Sample3D) -> Sample3D {
        *input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use common::constants::NANOS_PER_MILLI;

    fn vertical(timestamp: u64) -> Sample3D {
        Sample3D::new(timestamp, [0.0, 0.0, 9.81])
    }

    #[test]
    fn test_elevation_is_smoothed() {
        let mut processor = ElevationProcessor::new(0.6, TimestampFormat::ClockTime).unwrap();

        let first = processor.process(&vertical(1_000 * NANOS_PER_MILLI));
        let second = processor.process(&vertical(1_050 * NANOS_PER_MILLI));

        assert_relative_eq!(first.angle_degrees(), 54.0, epsilon = 1e-9);
        assert_eq!(first.timestamp(), "00:00:01.000");
        assert_relative_eq!(second.angle_degrees(), 75.6, epsilon = 1e-9);
        assert_eq!(second.timestamp(), "00:00:01.050");
    }

    #[test]
    fn test_reset_restarts_from_zero() {
        let mut processor = ElevationProcessor::new(0.6, TimestampFormat::EpochMillis).unwrap();
        processor.process(&vertical(0));
        processor.process(&vertical(0));

        processor.reset();

        assert_relative_eq!(
            processor.process(&vertical(0)).angle_degrees(),
            54.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_zero_vector_is_filtered_as_zero_degrees() {
        let mut processor = ElevationProcessor::new(0.5, TimestampFormat::EpochMillis).unwrap();
        processor.process(&vertical(0));

        let sample = processor.process(&Sample3D::new(0, [0.0, 0.0, 0.0]));

        assert_relative_eq!(sample.angle_degrees(), 22.5, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_alpha() {
        assert!(ElevationProcessor::new(2.0, TimestampFormat::ClockTime).is_err());
    }

    #[test]
    fn test_pass_through_processors() {
        let hr = HeartRateSample::new(72, 5);
        assert_eq!(HeartRateProcessor.process(&hr), hr);

        let gyro = Sample3D::new(7, [0.1, -0.2, 0.3]);
        assert_eq!(GyroscopeProcessor.process(&gyro), gyro);
    }
}
