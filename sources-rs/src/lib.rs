//! # Crate sources-rs
//!
//! Implementations of [`SampleSource`](common::SampleSource), the producers of raw
//! sensor samples consumed by stream sessions.
//!
//! - [`MockSource`]: in-process source. Tests inject events by hand, and the demo
//!   binary lets it synthesise a slowly tilting strap with Gaussian noise.
//! - [`PhyphoxSource`]: the phone's built-in accelerometer and gyroscope, read from
//!   the REST API exposed by the [`Phyphox`](https://phyphox.org/) app.
//! - [`PeriodicSampler`]: wraps another source and re-emits its most recent sample
//!   at a fixed cadence, stamped with the wall clock.

pub mod adapters;
pub(crate) mod constants;
mod helpers;
mod http_client;
pub mod sampler;

pub use adapters::mock::{MockSource, SyntheticConfig};
pub use adapters::phyphox::PhyphoxSource;
pub use sampler::PeriodicSampler;
