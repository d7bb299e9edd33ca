pub mod exporter;
pub mod processor;
pub mod publisher;
pub mod source;

pub use crate::traits::exporter::Exporter;
pub use crate::traits::processor::{FromReadings, SampleProcessor};
pub use crate::traits::publisher::Notifiable;
pub use crate::traits::source::SampleSource;
