pub mod elevation;
pub mod heart_rate;
pub mod sample_3d;

pub use crate::types::timed::elevation::ElevationSample;
pub use crate::types::timed::heart_rate::HeartRateSample;
pub use crate::types::timed::sample_3d::Sample3D;
