//! Error types shared by sample sources and exporters.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::SensorKind;

/// Represents the different types of errors a sample source can report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    /// The device identifier is unknown or unreachable.
    #[error("invalid device `{0}`")]
    InvalidDevice(String),

    /// A stream was requested from a device that is not connected.
    #[error("device `{0}` is not connected")]
    NotConnected(String),

    /// The source does not provide the requested sensor.
    #[error("sensor {0} not available")]
    SensorUnavailable(SensorKind),

    /// Error indicating that there was an issue building the client.
    #[error("client build failed: {0}")]
    ClientBuild(String),

    /// Error indicating that there was an issue fetching data.
    #[error("fetching data failed: {0}")]
    FetchData(String),

    /// Error indicating that the received data format is incorrect.
    #[error("incorrect data format: {0}")]
    IncorrectDataFormat(String),

    #[error("listener {0} not found")]
    ListenerNotFound(String),
}

/// Errors reported when writing an elevation series to its destination.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("invalid export destination `{0}`")]
    InvalidDestination(String),

    #[error("writing {path:?} failed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
