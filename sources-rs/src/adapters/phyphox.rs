//! Phone sensors read through the Phyphox REST API.

use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, error, info, warn};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use common::errors::SourceError;
use common::traits::{Notifiable, SampleSource};
use common::types::{DeviceEvent, Readings, Sample3D, SensorKind, StreamEvent};
use publisher::{Publishable, Publisher, PublisherManager};

use crate::constants::DEFAULT_POLL_PERIOD;
use crate::helpers;
use crate::http_client::HttpClient;

/// HTTP endpoints and commands.
const GET_CMD: &str = "/get?";
const CONTROL_CMD: &str = "/control?cmd=";
const START_CMD: &str = "start";
const STOP_CMD: &str = "stop";
const CLEAR_CMD: &str = "clear";
const CONFIG_CMD: &str = "/config?";

const SUPPORTED_SENSORS: [SensorKind; 2] = [SensorKind::Accelerometer, SensorKind::Gyroscope];

/// A polling task for one sensor, shared by all of that sensor's subscribers.
struct Poller {
    id: Uuid,
    token: CancellationToken,
}

/// Phone accelerometer and gyroscope served by the Phyphox app.
///
/// The phone needs no pairing, so any device id is accepted. Recording on the phone
/// is started on `connect` or with the first subscription, and stopped on
/// `disconnect` or when the last subscription goes away.
pub struct PhyphoxSource {
    client: Arc<HttpClient>,
    tag: String,
    poll_period: Duration,
    streams: PublisherManager<StreamEvent, SensorKind>,
    subscriptions: DashMap<Uuid, SensorKind>,
    pollers: Arc<DashMap<SensorKind, Poller>>,
    device_events: Publisher<DeviceEvent>,
    recording: AtomicBool,
}

impl PhyphoxSource {
    /// Returns a ClientBuild error if the HTTP client cannot be created.
    pub fn new(base_url: &str, tag: &str) -> Result<Self, SourceError> {
        Ok(Self {
            client: Arc::new(HttpClient::new(base_url)?),
            tag: tag.to_string(),
            poll_period: DEFAULT_POLL_PERIOD,
            streams: PublisherManager::new(&SUPPORTED_SENSORS),
            subscriptions: DashMap::new(),
            pollers: Arc::new(DashMap::new()),
            device_events: Publisher::new(),
            recording: AtomicBool::new(false),
        })
    }

    /// Sets how often the phone is asked for new samples.
    pub fn with_poll_period(mut self, poll_period: Duration) -> Self {
        self.poll_period = poll_period;
        self
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    async fn control(&self, command: &str) -> Result<(), SourceError> {
        self.client
            .fetch_json(&format!("{CONTROL_CMD}{}", command))
            .await?;
        Ok(())
    }

    async fn clear_cmd(&self) -> Result<(), SourceError> {
        info!("{}: clearing data...", self.tag);
        self.control(CLEAR_CMD).await
    }

    async fn start_cmd(&self) -> Result<(), SourceError> {
        info!("{}: starting recording...", self.tag);
        self.control(START_CMD).await
    }

    async fn stop_cmd(&self) -> Result<(), SourceError> {
        info!("{}: stopping recording...", self.tag);
        self.control(STOP_CMD).await
    }

    /// Clears previous data and starts recording, once.
    async fn ensure_recording(&self) -> Result<(), SourceError> {
        if self.recording.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let started = match self.clear_cmd().await {
            Ok(()) => self.start_cmd().await,
            Err(e) => Err(e),
        };
        if started.is_err() {
            self.recording.store(false, Ordering::SeqCst);
        }
        started
    }

    async fn stop_recording(&self) -> Result<(), SourceError> {
        if !self.recording.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        self.stop_cmd().await
    }

    fn spawn_poller(&self, sensor: SensorKind) {
        if self.pollers.contains_key(&sensor) {
            return;
        }
        let poller = Poller {
            id: Uuid::new_v4(),
            token: CancellationToken::new(),
        };
        let poll_id = poller.id;
        let token = poller.token.clone();
        self.pollers.insert(sensor, poller);

        let client = self.client.clone();
        let streams = self.streams.clone();
        let pollers = self.pollers.clone();
        let period = self.poll_period;
        let tag = self.tag.clone();

        tokio::spawn(async move {
            let mut last_time = 0.0;
            debug!("{}: polling {}", tag, sensor);

            let terminal = loop {
                tokio::select! {
                    _ = token.cancelled() => break None,
                    _ = tokio::time::sleep(period) => {
                        match get_data(&client, sensor, last_time).await {
                            Ok((_, false)) => {
                                info!("{}: recording stopped.", tag);
                                break Some(StreamEvent::Completed);
                            }
                            Ok((samples, true)) => {
                                helpers::update_measurement_time(&samples, &mut last_time);
                                if !samples.is_empty() && !token.is_cancelled() {
                                    let event = StreamEvent::Readings(Readings::Vectors(samples));
                                    streams.notify_listeners(sensor, Arc::new(event)).await;
                                }
                            }
                            Err(e) => {
                                error!("{}: error fetching {} data: {}", tag, sensor, e);
                                break Some(StreamEvent::Failed(e.to_string()));
                            }
                        }
                    }
                }
            };

            pollers.remove_if(&sensor, |_, poller| poller.id == poll_id);
            if let Some(event) = terminal {
                if !token.is_cancelled() {
                    streams.notify_listeners(sensor, Arc::new(event)).await;
                }
            }
            debug!("{}: stopped polling {}", tag, sensor);
        });
    }
}

/// Fetches the samples of `sensor` recorded after `since` (seconds) and whether the
/// phone is still measuring.
async fn get_data(
    client: &HttpClient,
    sensor: SensorKind,
    since: f64,
) -> Result<(Vec<Sample3D>, bool), SourceError> {
    let (time_var, variables) = helpers::control_str(sensor)?;
    let query = helpers::build_query(&variables, time_var, Some(since));
    let data: Value = client.fetch_json(&format!("{GET_CMD}{}", query)).await?;
    let status = helpers::get_status_from_json(&data)?;
    let results = helpers::parse_results(&data, &variables, time_var)?;
    let (timestamps, untimed_data) = helpers::combine_results(&results);

    Ok((helpers::to_samples(&timestamps, &untimed_data), status))
}

#[async_trait]
impl SampleSource for PhyphoxSource {
    fn get_tag(&self) -> &str {
        &self.tag
    }

    async fn connect(&self, device_id: &str) -> Result<(), SourceError> {
        self.device_events
            .notify_listeners(Arc::new(DeviceEvent::Connecting(device_id.to_string())))
            .await;
        self.ensure_recording().await?;
        info!("{}: connected to {}", self.tag, self.client.base_url());
        self.device_events
            .notify_listeners(Arc::new(DeviceEvent::Connected(device_id.to_string())))
            .await;
        Ok(())
    }

    async fn disconnect(&self, device_id: &str) -> Result<(), SourceError> {
        for entry in self.pollers.iter() {
            entry.value().token.cancel();
        }
        self.pollers.clear();
        self.stop_recording().await?;
        self.device_events
            .notify_listeners(Arc::new(DeviceEvent::Disconnected(device_id.to_string())))
            .await;
        Ok(())
    }

    /// Returns the sensors exported by the running Phyphox experiment.
    async fn get_available_sensors(&self) -> Result<Vec<SensorKind>, SourceError> {
        let config = self.client.fetch_json(CONFIG_CMD).await?;
        Ok(helpers::parse_available_sensors(&config))
    }

    async fn register_listener(
        &self,
        listener: &mut dyn Notifiable<StreamEvent>,
        _device_id: &str,
        sensor: SensorKind,
    ) -> Result<Uuid, SourceError> {
        helpers::control_str(sensor)?;
        self.ensure_recording().await?;
        let id = self
            .streams
            .add_listener(listener, &sensor)
            .map_err(|_| SourceError::SensorUnavailable(sensor))?;
        self.subscriptions.insert(id, sensor);
        self.spawn_poller(sensor);
        Ok(id)
    }

    async fn unregister_listener(&self, id: Uuid) {
        let Some((_, sensor)) = self.subscriptions.remove(&id) else {
            return;
        };
        let _ = self.streams.remove_listener(id);
        if self.streams.listener_count(&sensor) > 0 {
            return;
        }
        if let Some((_, poller)) = self.pollers.remove(&sensor) {
            poller.token.cancel();
        }
        if self.subscriptions.is_empty() {
            if let Err(e) = self.stop_recording().await {
                warn!("{}: could not stop recording: {}", self.tag, e);
            }
        }
    }

    async fn register_device_listener(&self, listener: &mut dyn Notifiable<DeviceEvent>) -> Uuid {
        self.device_events.register_listener(listener)
    }
}
