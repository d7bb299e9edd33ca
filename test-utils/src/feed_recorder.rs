use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use uuid::Uuid;

use common::errors::SourceError;
use common::traits::SampleSource;
use common::types::{SensorKind, StreamEvent};
use publisher::Listener;

/// Collects every value delivered to its listeners, in delivery order.
///
/// Subscriptions made through [`FeedRecorder::attach_listener`] are tracked, and
/// deliveries for a detached subscription are ignored.
pub struct FeedRecorder<T> {
    records: Arc<Mutex<Vec<T>>>,
    control: Arc<DashMap<Uuid, SensorKind>>,
    notify: Arc<Notify>,
}

impl<T> Clone for FeedRecorder<T> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
            control: self.control.clone(),
            notify: self.notify.clone(),
        }
    }
}

impl<T> Default for FeedRecorder<T> {
    fn default() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            control: Arc::new(DashMap::new()),
            notify: Arc::new(Notify::new()),
        }
    }
}

impl<T> FeedRecorder<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Listener recording every value it is called with.
    pub fn listener(&self) -> Listener<T> {
        let records = self.records.clone();
        let notify = self.notify.clone();
        Listener::new(move |_id, value: Arc<T>| {
            let records = records.clone();
            let notify = notify.clone();
            async move {
                records.lock().await.push((*value).clone());
                notify.notify_waiters();
            }
        })
    }

    pub async fn push(&self, value: T) {
        self.records.lock().await.push(value);
        self.notify.notify_waiters();
    }

    pub async fn records(&self) -> Vec<T> {
        self.records.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    pub async fn clear(&self) {
        self.records.lock().await.clear();
    }

    /// Waits until at least `count` values were recorded. Returns whether that
    /// happened before `timeout` elapsed.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.notify.notified();
                if self.records.lock().await.len() >= count {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }
}

impl FeedRecorder<StreamEvent> {
    /// Subscribes to `sensor` on `device_id`, recording its events.
    pub async fn attach_listener(
        &self,
        source: &dyn SampleSource,
        device_id: &str,
        sensor: SensorKind,
    ) -> Result<Uuid, SourceError> {
        let records = self.records.clone();
        let control = self.control.clone();
        let notify = self.notify.clone();
        let mut listener = Listener::new(move |id, event: Arc<StreamEvent>| {
            let records = records.clone();
            let control = control.clone();
            let notify = notify.clone();
            async move {
                if !control.contains_key(&id) {
                    return;
                }
                records.lock().await.push((*event).clone());
                notify.notify_waiters();
            }
        });
        let id = source
            .register_listener(&mut listener, device_id, sensor)
            .await?;
        self.control.insert(id, sensor);
        Ok(id)
    }

    pub async fn detach_listener(&self, source: &dyn SampleSource, id: Uuid) {
        self.control.remove(&id);
        source.unregister_listener(id).await;
    }
}
