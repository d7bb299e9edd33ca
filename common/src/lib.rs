//! General functionality for the `tilt-rs` workspace.
//!
//! Holds the sample types exchanged between sensor sources, stream sessions and
//! consumers, together with the traits at the seams between them.

pub mod constants;
pub mod errors;

#[doc(hidden)]
pub mod traits;
#[doc(hidden)]
pub mod types;

// Re-export traits
#[doc(inline)]
pub use traits::{Exporter, FromReadings, Notifiable, SampleProcessor, SampleSource};

// Re-export types
#[doc(inline)]
pub use types::{
    Clock, DeviceEvent, ElevationSample, Generation, HeartRateSample, Readings, Sample3D,
    SensorKind, StreamEvent, StreamKind, XYZ,
};
