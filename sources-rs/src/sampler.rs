//! Fixed-cadence re-sampling of another source.

use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use common::errors::SourceError;
use common::traits::{Notifiable, SampleSource};
use common::types::{Clock, DeviceEvent, Readings, Sample3D, SensorKind, StreamEvent};
use publisher::Listener;

struct Subscription {
    inner_id: Uuid,
    token: CancellationToken,
}

/// Wraps a source and, for every subscription, re-emits the most recent vector
/// sample every `interval`, stamped with the wall-clock time of the tick.
///
/// Ticks before the first sample arrives emit nothing. Heart rate readings and
/// terminal events are forwarded as they come.
pub struct PeriodicSampler {
    source: Arc<dyn SampleSource>,
    interval: Duration,
    tag: String,
    subscriptions: DashMap<Uuid, Subscription>,
}

impl PeriodicSampler {
    pub fn new(source: Arc<dyn SampleSource>, interval: Duration) -> Self {
        let tag = format!("{}@{}ms", source.get_tag(), interval.as_millis());
        Self {
            source,
            interval,
            tag,
            subscriptions: DashMap::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}

#[async_trait]
impl SampleSource for PeriodicSampler {
    fn get_tag(&self) -> &str {
        &self.tag
    }

    async fn connect(&self, device_id: &str) -> Result<(), SourceError> {
        self.source.connect(device_id).await
    }

    async fn disconnect(&self, device_id: &str) -> Result<(), SourceError> {
        self.source.disconnect(device_id).await
    }

    async fn get_available_sensors(&self) -> Result<Vec<SensorKind>, SourceError> {
        self.source.get_available_sensors().await
    }

    async fn register_listener(
        &self,
        listener: &mut dyn Notifiable<StreamEvent>,
        device_id: &str,
        sensor: SensorKind,
    ) -> Result<Uuid, SourceError> {
        let id = Uuid::new_v4();
        listener.set_id(id);
        let callback = listener.get_callback();
        let latest: Arc<Mutex<Option<Sample3D>>> = Arc::new(Mutex::new(None));
        let token = CancellationToken::new();

        let mut inner_listener = Listener::new({
            let latest = latest.clone();
            let token = token.clone();
            let callback = callback.clone();
            move |_inner_id, event: Arc<StreamEvent>| {
                let latest = latest.clone();
                let token = token.clone();
                let callback = callback.clone();
                async move {
                    if token.is_cancelled() {
                        return;
                    }
                    match event.as_ref() {
                        StreamEvent::Readings(Readings::Vectors(samples)) => {
                            if let Some(last) = samples.last() {
                                *latest.lock().await = Some(*last);
                            }
                        }
                        StreamEvent::Readings(Readings::HeartRate(_)) => {
                            callback(id, event.clone()).await
                        }
                        StreamEvent::Failed(_) | StreamEvent::Completed => {
                            token.cancel();
                            callback(id, event.clone()).await;
                        }
                    }
                }
            }
        });
        let inner_id = self
            .source
            .register_listener(&mut inner_listener, device_id, sensor)
            .await?;

        let interval = self.interval;
        let tag = self.tag.clone();
        let ticker_token = token.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = ticker_token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {
                        let sample = *latest.lock().await;
                        let Some(sample) = sample else {
                            continue;
                        };
                        if ticker_token.is_cancelled() {
                            break;
                        }
                        let stamped = sample.with_timestamp(Clock::now().as_nanos());
                        let event = StreamEvent::Readings(Readings::Vectors(vec![stamped]));
                        callback(id, Arc::new(event)).await;
                    }
                }
            }
            debug!("{}: ticker for {} stopped", tag, id);
        });

        self.subscriptions
            .insert(id, Subscription { inner_id, token });
        debug!("{}: {} sampling {} on {}", self.tag, id, sensor, device_id);
        Ok(id)
    }

    async fn unregister_listener(&self, id: Uuid) {
        if let Some((_, subscription)) = self.subscriptions.remove(&id) {
            subscription.token.cancel();
            self.source.unregister_listener(subscription.inner_id).await;
        }
    }

    async fn register_device_listener(&self, listener: &mut dyn Notifiable<DeviceEvent>) -> Uuid {
        self.source.register_device_listener(listener).await
    }
}
