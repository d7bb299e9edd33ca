use async_trait::async_trait;
use log::info;
use std::path::{Path, PathBuf};

use common::errors::ExportError;
use common::traits::Exporter;
use common::types::ElevationSample;

/// Writes elevation series as flat text files inside `directory`.
///
/// Each sample becomes a `"<angle>; <timestamp>"` line, the angle truncated
/// towards zero. Lines are separated by `\n` with no trailing newline. The file
/// is written next to its destination and renamed into place, so readers never
/// see a partial export.
#[derive(Debug, Clone)]
pub struct FileExporter {
    directory: PathBuf,
}

impl FileExporter {
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn render(series: &[ElevationSample]) -> String {
        series
            .iter()
            .map(ElevationSample::to_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl Exporter for FileExporter {
    async fn export(
        &self,
        series: &[ElevationSample],
        destination: &str,
    ) -> Result<PathBuf, ExportError> {
        let path = self.directory.join(destination);
        let file_name = match path.file_name() {
            Some(name) if !destination.trim().is_empty() => name.to_string_lossy().into_owned(),
            _ => return Err(ExportError::InvalidDestination(destination.to_string())),
        };
        let parent = path.parent().unwrap_or(&self.directory).to_path_buf();
        let io_error = |source: std::io::Error| ExportError::Io {
            path: path.clone(),
            source,
        };

        tokio::fs::create_dir_all(&parent).await.map_err(io_error)?;
        let temp_path = parent.join(format!(".{}.tmp", file_name));
        tokio::fs::write(&temp_path, Self::render(series))
            .await
            .map_err(io_error)?;
        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(io_error(e));
        }

        info!("Exported {} samples to {:?}", series.len(), path);
        Ok(path)
    }
}
