use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use common::constants::{EXTERNAL_ELEVATION_FILE, INTERNAL_ELEVATION_FILE};
use elevation_rs::DEFAULT_ALPHA;

use crate::errors::ConfigError;

/// Tunables of a [`SensorHub`](crate::SensorHub). Every field is optional in the
/// JSON form and falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Weight of the newest angle in the elevation filter.
    pub alpha: f64,
    /// Re-sampling period of the phone accelerometer.
    pub accelerometer_interval_ms: u64,
    /// Re-sampling period of the phone gyroscope.
    pub gyroscope_interval_ms: u64,
    /// Seconds counted down before a timed stream stops itself.
    pub countdown_start: u32,
    pub countdown_tick_ms: u64,
    pub export_directory: String,
    pub external_export_file: String,
    pub internal_export_file: String,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            accelerometer_interval_ms: 50,
            gyroscope_interval_ms: 500,
            countdown_start: 15,
            countdown_tick_ms: 1000,
            export_directory: ".".to_string(),
            external_export_file: EXTERNAL_ELEVATION_FILE.to_string(),
            internal_export_file: INTERNAL_ELEVATION_FILE.to_string(),
        }
    }
}

impl HubConfig {
    /// Loads and validates a JSON config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: HubConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.alpha.is_finite() || !(0.0..=1.0).contains(&self.alpha) {
            return Err(ConfigError::Invalid(format!(
                "alpha must be in [0, 1], got {}",
                self.alpha
            )));
        }
        if self.accelerometer_interval_ms == 0
            || self.gyroscope_interval_ms == 0
            || self.countdown_tick_ms == 0
        {
            return Err(ConfigError::Invalid("intervals must be non-zero".to_string()));
        }
        if self.external_export_file.trim().is_empty() || self.internal_export_file.trim().is_empty()
        {
            return Err(ConfigError::Invalid(
                "export file names must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn accelerometer_interval(&self) -> Duration {
        Duration::from_millis(self.accelerometer_interval_ms)
    }

    pub fn gyroscope_interval(&self) -> Duration {
        Duration::from_millis(self.gyroscope_interval_ms)
    }

    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms)
    }
}
