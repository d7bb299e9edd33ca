//! Shared test doubles and fixtures for the workspace crates.

pub mod csv_loader;
pub mod feed_recorder;
pub mod recording_exporter;

pub use csv_loader::{load_csv, load_csv_columns, test_data_path, CsvColumnMapper, CsvFileColum};
pub use feed_recorder::FeedRecorder;
pub use recording_exporter::RecordingExporter;
