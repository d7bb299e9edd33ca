//! # Crate elevation-rs
//!
//! Turns raw tri-axis acceleration into a smoothed elevation (tilt) angle.
//!
//! - [`filter`]: angle extraction and the exponentially weighted moving average.
//! - [`timestamp`]: rendering of sample timestamps for display and export.
//! - [`processor`]: per-stream [`SampleProcessor`](common::SampleProcessor)
//!   implementations used by stream sessions.
//!
//! ```
//! use common::Sample3D;
//! use common::SampleProcessor;
//! use elevation_rs::{ElevationProcessor, TimestampFormat};
//!
//! let mut processor = ElevationProcessor::new(0.6, TimestampFormat::EpochMillis).unwrap();
//! let sample = processor.process(&Sample3D::new(2_000_000, [0.0, 0.0, 9.81]));
//!
//! assert!((sample.angle_degrees() - 54.0).abs() < 1e-9);
//! assert_eq!(sample.timestamp(), "2");
//! ```

pub mod errors;
pub mod filter;
pub mod processor;
pub mod timestamp;

pub use errors::ElevationError;
pub use filter::{angle_from_vector, smooth, Ewma, DEFAULT_ALPHA};
pub use processor::{ElevationProcessor, GyroscopeProcessor, HeartRateProcessor};
pub use timestamp::TimestampFormat;
