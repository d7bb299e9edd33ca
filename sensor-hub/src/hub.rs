//! Coordination of the four stream kinds behind a single read surface.

use log::{debug, error, info, warn};
use std::sync::{Arc, Weak};
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use common::traits::{Exporter, SampleSource};
use common::types::{
    DeviceEvent, ElevationSample, Generation, HeartRateSample, Sample3D, StreamKind,
};
use elevation_rs::{ElevationProcessor, GyroscopeProcessor, HeartRateProcessor, TimestampFormat};
use publisher::{listener, Listener, Observable};
use sources_rs::PeriodicSampler;

use crate::config::HubConfig;
use crate::countdown::Countdown;
use crate::errors::HubError;
use crate::feed::{CombinedFeed, CombinedObservation};
use crate::session::{
    ExportTarget, SeriesSink, SessionSettings, StartOutcome, StreamSession, StreamView,
};

/// Point-in-time copy of everything a consumer can observe.
#[derive(Debug, Clone, PartialEq)]
pub struct HubState {
    pub hr_list: Vec<HeartRateSample>,
    pub external_elevation_list: Vec<ElevationSample>,
    pub internal_elevation_list: Vec<ElevationSample>,
    pub connected: bool,
    pub measuring: bool,
    pub timer: u32,
    pub device_id: Option<String>,
    pub active_stream: Option<StreamKind>,
}

/// Owns one session per stream kind and the state shared between them.
///
/// Heart rate and external elevation come from the paired strap, which must be
/// chosen and connected first. Internal elevation and gyroscope come from the
/// phone, resampled at fixed intervals. Every stream except heart rate is stopped
/// automatically when the countdown expires.
pub struct SensorHub {
    config: HubConfig,
    external: Arc<dyn SampleSource>,
    heart_rate: StreamSession<HeartRateProcessor>,
    external_elevation: StreamSession<ElevationProcessor>,
    internal_elevation: StreamSession<ElevationProcessor>,
    gyroscope: StreamSession<GyroscopeProcessor>,
    device_id: Observable<Option<String>>,
    connected: Observable<bool>,
    measuring: Observable<bool>,
    active_stream: Mutex<Option<StreamKind>>,
    countdown: Countdown,
    weak_self: Weak<SensorHub>,
}

impl SensorHub {
    /// Builds a hub reading from `external` (the strap) and `internal` (the phone).
    /// Completed elevation series are written through `exporter`.
    pub async fn new(
        config: HubConfig,
        external: Arc<dyn SampleSource>,
        internal: Arc<dyn SampleSource>,
        exporter: Arc<dyn Exporter>,
    ) -> Result<Arc<Self>, HubError> {
        config.validate()?;

        let external_processor = ElevationProcessor::new(config.alpha, TimestampFormat::ClockTime)?;
        let internal_processor =
            ElevationProcessor::new(config.alpha, TimestampFormat::EpochMillis)?;

        let accelerometer: Arc<dyn SampleSource> = Arc::new(PeriodicSampler::new(
            internal.clone(),
            config.accelerometer_interval(),
        ));
        let gyroscope: Arc<dyn SampleSource> =
            Arc::new(PeriodicSampler::new(internal, config.gyroscope_interval()));

        let external_sink: Arc<dyn SeriesSink<ElevationSample>> = Arc::new(ExportTarget::new(
            exporter.clone(),
            &config.external_export_file,
        ));
        let internal_sink: Arc<dyn SeriesSink<ElevationSample>> =
            Arc::new(ExportTarget::new(exporter, &config.internal_export_file));

        let heart_rate = StreamSession::new(
            StreamKind::HeartRate,
            external.clone(),
            HeartRateProcessor,
            SessionSettings {
                sink: None,
                clear_current_on_stop: true,
            },
        );
        let external_elevation = StreamSession::new(
            StreamKind::ExternalElevation,
            external.clone(),
            external_processor,
            SessionSettings {
                sink: Some(external_sink),
                clear_current_on_stop: false,
            },
        );
        let internal_elevation = StreamSession::new(
            StreamKind::InternalElevation,
            accelerometer,
            internal_processor,
            SessionSettings {
                sink: Some(internal_sink),
                clear_current_on_stop: false,
            },
        );
        let gyroscope = StreamSession::new(
            StreamKind::Gyroscope,
            gyroscope,
            GyroscopeProcessor,
            SessionSettings::default(),
        );
        let countdown = Countdown::new(config.countdown_start, config.countdown_tick());

        let hub = Arc::new_cyclic(|weak_self| SensorHub {
            config,
            external,
            heart_rate,
            external_elevation,
            internal_elevation,
            gyroscope,
            device_id: Observable::new(None),
            connected: Observable::new(false),
            measuring: Observable::new(false),
            active_stream: Mutex::new(None),
            countdown,
            weak_self: weak_self.clone(),
        });

        let mut listener = hub.device_listener();
        hub.external.register_device_listener(&mut listener).await;
        info!(
            "Sensor hub ready: strap source {}, countdown {} ticks",
            hub.external.get_tag(),
            hub.config.countdown_start
        );
        Ok(hub)
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Selects the strap that external streams and connections refer to.
    pub fn choose_sensor(&self, device_id: &str) {
        info!("Selected sensor {}", device_id);
        self.device_id.set(Some(device_id.to_string()));
    }

    pub async fn connect_to_sensor(&self) -> Result<(), HubError> {
        let device_id = self.selected_device()?;
        self.external.connect(&device_id).await.map_err(|e| {
            error!("Connecting to {} failed: {}", device_id, e);
            HubError::from(e)
        })
    }

    /// Stops the active stream, then disconnects the selected strap.
    pub async fn disconnect_from_sensor(&self) -> Result<(), HubError> {
        let device_id = self.selected_device()?;
        self.stop_data_stream().await;
        self.external.disconnect(&device_id).await.map_err(|e| {
            error!("Disconnecting from {} failed: {}", device_id, e);
            HubError::from(e)
        })
    }

    pub async fn start_heart_rate(&self) -> Result<StartOutcome, HubError> {
        self.start_stream(StreamKind::HeartRate).await
    }

    pub async fn start_external_elevation(&self) -> Result<StartOutcome, HubError> {
        self.start_stream(StreamKind::ExternalElevation).await
    }

    pub async fn start_internal_elevation(&self) -> Result<StartOutcome, HubError> {
        self.start_stream(StreamKind::InternalElevation).await
    }

    pub async fn start_gyroscope(&self) -> Result<StartOutcome, HubError> {
        self.start_stream(StreamKind::Gyroscope).await
    }

    /// Starts `kind` and makes it the active stream.
    ///
    /// Heart rate only cancels a pending countdown; any other kind restarts it.
    /// Starting a kind that is already streaming changes nothing.
    pub async fn start_stream(&self, kind: StreamKind) -> Result<StartOutcome, HubError> {
        let device_id = match kind.fixed_device() {
            Some(device_id) => device_id.to_string(),
            None => self.selected_device()?,
        };

        let outcome = match kind {
            StreamKind::HeartRate => self.heart_rate.start(&device_id).await,
            StreamKind::Gyroscope => self.gyroscope.start(&device_id).await,
            StreamKind::ExternalElevation => self.external_elevation.start(&device_id).await,
            StreamKind::InternalElevation => self.internal_elevation.start(&device_id).await,
        }?;

        if let StartOutcome::Started(generation) = outcome {
            *self.active_stream.lock().await = Some(kind);
            self.measuring.set(true);
            if kind == StreamKind::HeartRate {
                self.countdown.cancel().await;
            } else {
                self.restart_countdown(kind, generation).await;
            }
            debug!("Active stream is now {} ({})", kind, generation);
        }
        Ok(outcome)
    }

    /// Stops `kind`. Returns `false` if it was not streaming.
    pub async fn stop_stream(&self, kind: StreamKind) -> bool {
        let stopped = self.stop_session(kind).await;
        let was_active = {
            let mut active = self.active_stream.lock().await;
            if *active == Some(kind) {
                *active = None;
                true
            } else {
                false
            }
        };
        if was_active {
            self.countdown.cancel().await;
            self.measuring.set(false);
        }
        stopped
    }

    /// Cancels the countdown and stops whichever stream is active.
    ///
    /// The measuring flag is cleared once the stream is stopped and its series
    /// exported.
    pub async fn stop_data_stream(&self) -> bool {
        self.countdown.cancel().await;
        let active = self.active_stream.lock().await.take();
        let stopped = match active {
            Some(kind) => {
                info!("Stopping data stream {}", kind);
                self.stop_session(kind).await
            }
            None => {
                debug!("No active data stream to stop");
                false
            }
        };
        self.measuring.set(false);
        stopped
    }

    pub fn heart_rate_view(&self) -> StreamView<HeartRateSample> {
        self.heart_rate.view()
    }

    pub fn external_elevation_view(&self) -> StreamView<ElevationSample> {
        self.external_elevation.view()
    }

    pub fn internal_elevation_view(&self) -> StreamView<ElevationSample> {
        self.internal_elevation.view()
    }

    pub fn gyroscope_view(&self) -> StreamView<Sample3D> {
        self.gyroscope.view()
    }

    pub fn is_streaming(&self, kind: StreamKind) -> bool {
        match kind {
            StreamKind::HeartRate => self.heart_rate.is_streaming(),
            StreamKind::Gyroscope => self.gyroscope.is_streaming(),
            StreamKind::ExternalElevation => self.external_elevation.is_streaming(),
            StreamKind::InternalElevation => self.internal_elevation.is_streaming(),
        }
    }

    /// Flag of `kind`, updated whenever its session starts or ends.
    pub fn streaming(&self, kind: StreamKind) -> watch::Receiver<bool> {
        match kind {
            StreamKind::HeartRate => self.heart_rate.view().streaming,
            StreamKind::Gyroscope => self.gyroscope.view().streaming,
            StreamKind::ExternalElevation => self.external_elevation.view().streaming,
            StreamKind::InternalElevation => self.internal_elevation.view().streaming,
        }
    }

    pub fn device_id(&self) -> Option<String> {
        self.device_id.get()
    }

    pub fn connected(&self) -> bool {
        self.connected.get()
    }

    pub fn measuring(&self) -> bool {
        self.measuring.get()
    }

    pub fn subscribe_measuring(&self) -> watch::Receiver<bool> {
        self.measuring.subscribe()
    }

    pub fn countdown(&self) -> u32 {
        self.countdown.remaining()
    }

    pub fn subscribe_countdown(&self) -> watch::Receiver<u32> {
        self.countdown.subscribe()
    }

    pub async fn active_stream(&self) -> Option<StreamKind> {
        *self.active_stream.lock().await
    }

    pub async fn snapshot(&self) -> HubState {
        HubState {
            hr_list: self.heart_rate.history(),
            external_elevation_list: self.external_elevation.history(),
            internal_elevation_list: self.internal_elevation.history(),
            connected: self.connected(),
            measuring: self.measuring(),
            timer: self.countdown(),
            device_id: self.device_id(),
            active_stream: self.active_stream().await,
        }
    }

    /// Changes of every kind's current value, merged in priority order.
    pub fn combined_feed(&self) -> CombinedFeed {
        CombinedFeed::new(
            self.heart_rate.view().current,
            self.gyroscope.view().current,
            self.external_elevation.view().current,
            self.internal_elevation.view().current,
        )
    }

    /// First non-empty current value, in priority order.
    pub fn latest_combined(&self) -> Option<CombinedObservation> {
        self.heart_rate
            .current()
            .map(CombinedObservation::HeartRate)
            .or_else(|| self.gyroscope.current().map(CombinedObservation::Gyroscope))
            .or_else(|| {
                self.external_elevation
                    .current()
                    .map(CombinedObservation::ExternalElevation)
            })
            .or_else(|| {
                self.internal_elevation
                    .current()
                    .map(CombinedObservation::InternalElevation)
            })
    }

    fn selected_device(&self) -> Result<String, HubError> {
        self.device_id.get().ok_or_else(|| {
            warn!("No sensor selected");
            HubError::NoDeviceSelected
        })
    }

    async fn stop_session(&self, kind: StreamKind) -> bool {
        match kind {
            StreamKind::HeartRate => self.heart_rate.stop().await,
            StreamKind::Gyroscope => self.gyroscope.stop().await,
            StreamKind::ExternalElevation => self.external_elevation.stop().await,
            StreamKind::InternalElevation => self.internal_elevation.stop().await,
        }
    }

    async fn stop_session_generation(&self, kind: StreamKind, generation: Generation) -> bool {
        match kind {
            StreamKind::HeartRate => self.heart_rate.stop_generation(generation).await,
            StreamKind::Gyroscope => self.gyroscope.stop_generation(generation).await,
            StreamKind::ExternalElevation => {
                self.external_elevation.stop_generation(generation).await
            }
            StreamKind::InternalElevation => {
                self.internal_elevation.stop_generation(generation).await
            }
        }
    }

    async fn generation_of(&self, kind: StreamKind) -> Generation {
        match kind {
            StreamKind::HeartRate => self.heart_rate.generation().await,
            StreamKind::Gyroscope => self.gyroscope.generation().await,
            StreamKind::ExternalElevation => self.external_elevation.generation().await,
            StreamKind::InternalElevation => self.internal_elevation.generation().await,
        }
    }

    /// Arms the countdown for the session `kind` just started as `generation`.
    async fn restart_countdown(&self, kind: StreamKind, generation: Generation) {
        let hub = self.weak_self.clone();
        self.countdown
            .start(move || async move {
                if let Some(hub) = hub.upgrade() {
                    hub.on_countdown_expired(kind, generation).await;
                }
            })
            .await;
    }

    /// Stops the session the countdown was armed for, unless another start has
    /// replaced it in the meantime.
    async fn on_countdown_expired(&self, kind: StreamKind, generation: Generation) {
        {
            let mut active = self.active_stream.lock().await;
            if *active != Some(kind) || self.generation_of(kind).await != generation {
                debug!(
                    "Countdown of {} ({}) expired after {:?} took over",
                    kind, generation, *active
                );
                return;
            }
            *active = None;
        }

        info!("Countdown expired, stopping {}", kind);
        self.stop_session_generation(kind, generation).await;
        if self.active_stream.lock().await.is_none() {
            self.measuring.set(false);
        }
    }

    fn device_listener(&self) -> Listener<DeviceEvent> {
        let hub = self.weak_self.clone();
        listener!(weak hub.on_device_event)
    }

    async fn on_device_event(&self, _id: Uuid, event: Arc<DeviceEvent>) {
        if let Some(selected) = self.device_id.get() {
            if selected != event.device_id() {
                debug!("Ignoring event of unselected device {}", event.device_id());
                return;
            }
        }

        match event.as_ref() {
            DeviceEvent::Connecting(device_id) => info!("Connecting to {}", device_id),
            DeviceEvent::Connected(device_id) => {
                info!("Connected to {}", device_id);
                self.connected.set(true);
            }
            DeviceEvent::Disconnected(device_id) => {
                info!("Disconnected from {}", device_id);
                self.connected.set(false);
            }
            DeviceEvent::BatteryLevel { device_id, level } => {
                info!("Battery level of {}: {}%", device_id, level)
            }
            DeviceEvent::Information {
                device_id,
                key,
                value,
            } => debug!("{} {}: {}", device_id, key, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::SensorKind;
    use sources_rs::MockSource;
    use test_utils::RecordingExporter;

    const STRAP: &str = "A0:9E:1A:00:00:01";

    async fn hub() -> (Arc<SensorHub>, Arc<MockSource>) {
        let strap = Arc::new(MockSource::new(
            "strap",
            &[SensorKind::Accelerometer, SensorKind::HeartRate],
        ));
        let phone = Arc::new(MockSource::builtin(
            "phone",
            &[SensorKind::Accelerometer, SensorKind::Gyroscope],
        ));
        let hub = SensorHub::new(
            HubConfig::default(),
            strap.clone(),
            phone,
            Arc::new(RecordingExporter::new()),
        )
        .await
        .unwrap();
        (hub, strap)
    }

    #[tokio::test]
    async fn test_external_streams_need_a_device() {
        let (hub, _) = hub().await;

        assert!(matches!(
            hub.connect_to_sensor().await,
            Err(HubError::NoDeviceSelected)
        ));
        assert!(matches!(
            hub.start_heart_rate().await,
            Err(HubError::NoDeviceSelected)
        ));
        assert!(!hub.measuring());
    }

    #[tokio::test]
    async fn test_connected_follows_device_events() {
        let (hub, strap) = hub().await;
        hub.choose_sensor(STRAP);

        hub.connect_to_sensor().await.unwrap();
        assert!(hub.connected());

        strap
            .emit_device_event(DeviceEvent::Disconnected("someone-else".to_string()))
            .await;
        assert!(hub.connected());

        hub.disconnect_from_sensor().await.unwrap();
        assert!(!hub.connected());
    }

    #[tokio::test]
    async fn test_failed_connection_keeps_state() {
        let (hub, _) = hub().await;
        hub.choose_sensor(STRAP);

        assert!(matches!(
            hub.disconnect_from_sensor().await,
            Err(HubError::Source(_))
        ));
        assert!(!hub.connected());
        assert_eq!(hub.device_id().as_deref(), Some(STRAP));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = HubConfig {
            alpha: 1.5,
            ..HubConfig::default()
        };
        let source = Arc::new(MockSource::builtin("phone", &[SensorKind::Gyroscope]));
        let result = SensorHub::new(
            config,
            source.clone(),
            source,
            Arc::new(RecordingExporter::new()),
        )
        .await;

        assert!(matches!(result, Err(HubError::Config(_))));
    }

    #[tokio::test]
    async fn test_latest_combined_priority() {
        let (hub, _) = hub().await;
        assert_eq!(hub.latest_combined(), None);

        let generation = match hub.start_gyroscope().await.unwrap() {
            StartOutcome::Started(generation) => generation,
            other => panic!("unexpected {:?}", other),
        };
        hub.gyroscope
            .on_event(
                generation,
                &common::StreamEvent::Readings(common::Readings::Vectors(vec![
                    Sample3D::new(1, [0.1, 0.0, 0.0]),
                ])),
            )
            .await;

        assert_eq!(
            hub.latest_combined().map(|o| o.kind()),
            Some(StreamKind::Gyroscope)
        );
        hub.stop_data_stream().await;
    }

    fn started(outcome: Result<StartOutcome, HubError>) -> Generation {
        match outcome.unwrap() {
            StartOutcome::Started(generation) => generation,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_expiry_leaves_a_newer_active_stream() {
        let (hub, _) = hub().await;
        hub.choose_sensor(STRAP);
        hub.connect_to_sensor().await.unwrap();
        let external = started(hub.start_external_elevation().await);
        hub.start_gyroscope().await.unwrap();

        hub.on_countdown_expired(StreamKind::ExternalElevation, external)
            .await;

        assert!(hub.is_streaming(StreamKind::ExternalElevation));
        assert!(hub.is_streaming(StreamKind::Gyroscope));
        assert_eq!(hub.active_stream().await, Some(StreamKind::Gyroscope));
        assert!(hub.measuring());
        hub.stop_stream(StreamKind::ExternalElevation).await;
        hub.stop_data_stream().await;
    }

    #[tokio::test]
    async fn test_expiry_leaves_a_restarted_session() {
        let (hub, _) = hub().await;
        let first = started(hub.start_gyroscope().await);
        hub.stop_stream(StreamKind::Gyroscope).await;
        let second = started(hub.start_gyroscope().await);
        assert_ne!(first, second);

        hub.on_countdown_expired(StreamKind::Gyroscope, first).await;
        assert!(hub.is_streaming(StreamKind::Gyroscope));
        assert!(hub.measuring());

        hub.on_countdown_expired(StreamKind::Gyroscope, second).await;
        assert!(!hub.is_streaming(StreamKind::Gyroscope));
        assert_eq!(hub.active_stream().await, None);
        assert!(!hub.measuring());
    }
}
