//! In-process sample source.

mod gaussian;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::f64::consts::PI;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use common::constants::NANOS_PER_SECOND;
use common::errors::SourceError;
use common::traits::{Notifiable, SampleSource};
use common::types::{
    Clock, DeviceEvent, HeartRateSample, Readings, Sample3D, SensorKind, StreamEvent,
};
use publisher::{Publishable, Publisher, PublisherManager};

use crate::constants::{SENSOR_EPOCH_OFFSET_SECS, STANDARD_GRAVITY};
use gaussian::GaussianNoise;

const FULL_BATTERY: u8 = 100;

/// Shape of the data produced by [`MockSource::spawn_synthetic`].
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// Period between generated motion samples.
    pub sample_period: Duration,
    /// Peak elevation of the simulated tilt, in degrees.
    pub tilt_amplitude_degrees: f64,
    /// Duration of a full tilt up-and-down cycle.
    pub tilt_period: Duration,
    /// Standard deviation of the noise added to every axis.
    pub noise_stdev: f64,
    pub heart_rate_bpm: u32,
    pub heart_rate_period: Duration,
    /// Stamp samples relative to 2000-01-01 instead of the UNIX epoch.
    pub sensor_epoch: bool,
    /// Fixes the noise sequence for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            sample_period: Duration::from_millis(20),
            tilt_amplitude_degrees: 45.0,
            tilt_period: Duration::from_secs(10),
            noise_stdev: 0.05,
            heart_rate_bpm: 72,
            heart_rate_period: Duration::from_secs(1),
            sensor_epoch: true,
            seed: None,
        }
    }
}

/// Sample source living in the same process.
///
/// Devices must be connected before their streams can be subscribed to, unless the
/// source is created with [`MockSource::builtin`]. Events reach subscribers through
/// [`MockSource::emit`], or from a synthetic generator task.
pub struct MockSource {
    tag: String,
    sensors: Vec<SensorKind>,
    known_devices: Option<HashSet<String>>,
    requires_connection: bool,
    connected: DashSet<String>,
    streams: PublisherManager<StreamEvent, SensorKind>,
    subscriptions: DashMap<Uuid, (String, SensorKind)>,
    device_events: Publisher<DeviceEvent>,
}

impl MockSource {
    /// Source accepting any device id, which must be connected before streaming.
    pub fn new(tag: &str, sensors: &[SensorKind]) -> Self {
        Self {
            tag: tag.to_string(),
            sensors: sensors.to_vec(),
            known_devices: None,
            requires_connection: true,
            connected: DashSet::new(),
            streams: PublisherManager::new(sensors),
            subscriptions: DashMap::new(),
            device_events: Publisher::new(),
        }
    }

    /// Source standing for sensors built into the host, streamable without connecting.
    pub fn builtin(tag: &str, sensors: &[SensorKind]) -> Self {
        Self {
            requires_connection: false,
            ..Self::new(tag, sensors)
        }
    }

    /// Restricts the device ids this source recognises.
    pub fn with_known_devices(mut self, device_ids: &[&str]) -> Self {
        self.known_devices = Some(device_ids.iter().map(|id| id.to_string()).collect());
        self
    }

    pub fn is_connected(&self, device_id: &str) -> bool {
        self.connected.contains(device_id)
    }

    /// Number of live subscriptions to `sensor`.
    pub fn listener_count(&self, sensor: SensorKind) -> usize {
        self.streams.listener_count(&sensor)
    }

    /// Delivers `event` to every subscriber of `sensor` and waits for them.
    pub async fn emit(&self, sensor: SensorKind, event: StreamEvent) {
        self.streams.notify_listeners(sensor, Arc::new(event)).await;
    }

    pub async fn emit_device_event(&self, event: DeviceEvent) {
        self.device_events.notify_listeners(Arc::new(event)).await;
    }

    /// Starts generating a tilting gravity vector, angular velocity and heart rate
    /// for every sensor of this source, until `token` is cancelled.
    pub fn spawn_synthetic(
        self: &Arc<Self>,
        config: SyntheticConfig,
        token: CancellationToken,
    ) -> Result<JoinHandle<()>, SourceError> {
        let noise = GaussianNoise::new(0.0, config.noise_stdev).map_err(|e| {
            SourceError::ClientBuild(format!("noise deviation {}: {}", config.noise_stdev, e))
        })?;
        if config.sample_period.is_zero() || config.tilt_period.is_zero() {
            return Err(SourceError::ClientBuild(
                "synthetic periods must be non-zero".to_string(),
            ));
        }
        let source = self.clone();
        info!("{}: starting synthetic data generator", self.tag);

        Ok(tokio::spawn(async move {
            let mut rng = match config.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let mut generator = SyntheticGenerator::new(config, noise);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(generator.config.sample_period) => {
                        for (sensor, readings) in generator.tick(&mut rng) {
                            if source.sensors.contains(&sensor) {
                                source.emit(sensor, StreamEvent::Readings(readings)).await;
                            }
                        }
                    }
                }
            }
            debug!("{}: synthetic data generator stopped", source.tag);
        }))
    }

    fn check_device(&self, device_id: &str) -> Result<(), SourceError> {
        match &self.known_devices {
            Some(known) if !known.contains(device_id) => {
                Err(SourceError::InvalidDevice(device_id.to_string()))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl SampleSource for MockSource {
    fn get_tag(&self) -> &str {
        &self.tag
    }

    async fn connect(&self, device_id: &str) -> Result<(), SourceError> {
        self.check_device(device_id)?;
        self.emit_device_event(DeviceEvent::Connecting(device_id.to_string()))
            .await;
        self.connected.insert(device_id.to_string());
        info!("{}: connected to {}", self.tag, device_id);
        self.emit_device_event(DeviceEvent::Connected(device_id.to_string()))
            .await;
        self.emit_device_event(DeviceEvent::BatteryLevel {
            device_id: device_id.to_string(),
            level: FULL_BATTERY,
        })
        .await;
        Ok(())
    }

    async fn disconnect(&self, device_id: &str) -> Result<(), SourceError> {
        self.check_device(device_id)?;
        if self.connected.remove(device_id).is_none() {
            return Err(SourceError::NotConnected(device_id.to_string()));
        }
        info!("{}: disconnected from {}", self.tag, device_id);
        self.emit_device_event(DeviceEvent::Disconnected(device_id.to_string()))
            .await;
        Ok(())
    }

    async fn get_available_sensors(&self) -> Result<Vec<SensorKind>, SourceError> {
        Ok(self.streams.get_available_publisher_types())
    }

    async fn register_listener(
        &self,
        listener: &mut dyn Notifiable<StreamEvent>,
        device_id: &str,
        sensor: SensorKind,
    ) -> Result<Uuid, SourceError> {
        self.check_device(device_id)?;
        if self.requires_connection && !self.is_connected(device_id) {
            return Err(SourceError::NotConnected(device_id.to_string()));
        }
        let id = self
            .streams
            .add_listener(listener, &sensor)
            .map_err(|_| SourceError::SensorUnavailable(sensor))?;
        self.subscriptions.insert(id, (device_id.to_string(), sensor));
        debug!("{}: {} subscribed to {} on {}", self.tag, id, sensor, device_id);
        Ok(id)
    }

    async fn unregister_listener(&self, id: Uuid) {
        if self.subscriptions.remove(&id).is_some() {
            let _ = self.streams.remove_listener(id);
            debug!("{}: {} unsubscribed", self.tag, id);
        }
    }

    async fn register_device_listener(&self, listener: &mut dyn Notifiable<DeviceEvent>) -> Uuid {
        self.device_events.register_listener(listener)
    }
}

/// Deterministic part of the synthetic signal, advanced one sample period per tick.
struct SyntheticGenerator {
    config: SyntheticConfig,
    noise: GaussianNoise,
    elapsed: Duration,
    since_heart_rate: Duration,
}

impl SyntheticGenerator {
    fn new(config: SyntheticConfig, noise: GaussianNoise) -> Self {
        Self {
            config,
            noise,
            elapsed: Duration::ZERO,
            since_heart_rate: Duration::ZERO,
        }
    }

    fn timestamp(&self) -> u64 {
        let now = Clock::now().as_nanos();
        if self.config.sensor_epoch {
            now.saturating_sub(SENSOR_EPOCH_OFFSET_SECS * NANOS_PER_SECOND)
        } else {
            now
        }
    }

    fn tilt(&self, elapsed: Duration) -> f64 {
        let phase = 2.0 * PI * elapsed.as_secs_f64() / self.config.tilt_period.as_secs_f64();
        self.config.tilt_amplitude_degrees.to_radians() * (0.5 - 0.5 * phase.cos())
    }

    fn tick(&mut self, rng: &mut StdRng) -> Vec<(SensorKind, Readings)> {
        let previous_tilt = self.tilt(self.elapsed);
        self.elapsed += self.config.sample_period;
        self.since_heart_rate += self.config.sample_period;
        let tilt = self.tilt(self.elapsed);
        let timestamp = self.timestamp();

        let gravity = [
            STANDARD_GRAVITY * tilt.cos(),
            0.0,
            STANDARD_GRAVITY * tilt.sin(),
        ];
        let angular_velocity = [
            0.0,
            (tilt - previous_tilt) / self.config.sample_period.as_secs_f64(),
            0.0,
        ];

        let mut readings = vec![
            (
                SensorKind::Accelerometer,
                Readings::Vectors(vec![Sample3D::new(
                    timestamp,
                    self.noise.add_noise_xyz(rng, gravity),
                )]),
            ),
            (
                SensorKind::Gyroscope,
                Readings::Vectors(vec![Sample3D::new(
                    timestamp,
                    self.noise.add_noise_xyz(rng, angular_velocity),
                )]),
            ),
        ];

        if self.since_heart_rate >= self.config.heart_rate_period {
            self.since_heart_rate = Duration::ZERO;
            let bpm = self.noise.add_noise(rng, self.config.heart_rate_bpm as f64);
            readings.push((
                SensorKind::HeartRate,
                Readings::HeartRate(vec![HeartRateSample::new(
                    bpm.round().max(0.0) as u32,
                    timestamp,
                )]),
            ));
        }
        readings
    }
}
