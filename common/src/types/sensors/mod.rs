pub mod sensor_kind;
pub mod stream_kind;

pub use crate::types::sensors::sensor_kind::SensorKind;
pub use crate::types::sensors::stream_kind::StreamKind;
