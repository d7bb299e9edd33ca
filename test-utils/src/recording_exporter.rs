use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use common::errors::ExportError;
use common::traits::Exporter;
use common::types::ElevationSample;

/// In-memory [`Exporter`] that records every call, optionally failing them.
#[derive(Clone, Default)]
pub struct RecordingExporter {
    exports: Arc<Mutex<Vec<(String, Vec<ElevationSample>)>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent exports fail with an I/O error.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Every export seen so far, as `(destination, series)`.
    pub async fn exports(&self) -> Vec<(String, Vec<ElevationSample>)> {
        self.exports.lock().await.clone()
    }

    pub async fn export_count(&self) -> usize {
        self.exports.lock().await.len()
    }

    /// Series exported to `destination`, most recent last.
    pub async fn exports_to(&self, destination: &str) -> Vec<Vec<ElevationSample>> {
        self.exports
            .lock()
            .await
            .iter()
            .filter(|(name, _)| name == destination)
            .map(|(_, series)| series.clone())
            .collect()
    }
}

#[async_trait]
impl Exporter for RecordingExporter {
    async fn export(
        &self,
        series: &[ElevationSample],
        destination: &str,
    ) -> Result<PathBuf, ExportError> {
        self.exports
            .lock()
            .await
            .push((destination.to_string(), series.to_vec()));

        if self.fail.load(Ordering::SeqCst) {
            return Err(ExportError::Io {
                path: PathBuf::from(destination),
                source: std::io::Error::new(std::io::ErrorKind::Other, "export disabled"),
            });
        }
        Ok(PathBuf::from(destination))
    }
}
