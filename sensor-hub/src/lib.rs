//! # Crate sensor_hub
//!
//! Turns raw samples from a paired strap and from the phone's own sensors into
//! four observable streams: heart rate, gyroscope, and elevation angle measured
//! by either device.
//!
//! A [`SensorHub`] owns one [`StreamSession`] per stream kind. Each session
//! subscribes to a [`common::SampleSource`], runs every sample through its
//! processor and publishes the latest value, the series recorded since it
//! started, and whether it is streaming. Elevation series are exported when
//! their session stops. Streams other than heart rate stop on their own when
//! the hub's [`Countdown`] expires.

pub mod config;
pub mod countdown;
pub mod errors;
pub mod exporter;
pub mod feed;
pub mod hub;
pub mod session;

pub use config::HubConfig;
pub use countdown::Countdown;
pub use errors::{ConfigError, HubError};
pub use exporter::FileExporter;
pub use feed::{CombinedFeed, CombinedObservation};
pub use hub::{HubState, SensorHub};
pub use session::{
    ExportTarget, SeriesSink, SessionSettings, StartOutcome, StreamSession, StreamView,
};
