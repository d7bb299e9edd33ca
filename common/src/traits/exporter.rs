use async_trait::async_trait;
use std::path::PathBuf;

use crate::errors::ExportError;
use crate::types::ElevationSample;

/// Sink for a completed elevation series.
#[async_trait]
pub trait Exporter: Send + Sync {
    /// Writes `series` to `destination` and returns where it ended up.
    async fn export(
        &self,
        series: &[ElevationSample],
        destination: &str,
    ) -> Result<PathBuf, ExportError>;
}
