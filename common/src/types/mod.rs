pub mod callback;
pub mod clock;
pub mod events;
pub mod generation;
pub mod sensors;
pub mod timed;
pub mod untimed;

pub use callback::Callback;
pub use clock::Clock;
pub use events::{DeviceEvent, Readings, StreamEvent};
pub use generation::Generation;
pub use sensors::{SensorKind, StreamKind};
pub use timed::{ElevationSample, HeartRateSample, Sample3D};
pub use untimed::XYZ;
