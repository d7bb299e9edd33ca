use std::path::PathBuf;
use thiserror::Error;

use common::errors::SourceError;
use elevation_rs::ElevationError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path:?} failed: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum HubError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Elevation(#[from] ElevationError),

    #[error(transparent)]
    Source(#[from] SourceError),

    /// An external stream or connection was requested before choosing a device.
    #[error("no sensor device selected")]
    NoDeviceSelected,
}
