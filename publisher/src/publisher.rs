use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::join_all;
use std::sync::Arc;
use uuid::Uuid;

use common::traits::Notifiable;
use common::types::Callback;

#[async_trait]
pub trait Publishable<T> {
    fn register_listener(&self, listener: &mut dyn Notifiable<T>) -> Uuid;
    fn unregister_listener(&self, listener_id: Uuid) -> bool;
    fn unregister_all(&self);
    async fn notify_listeners(&self, data: Arc<T>);
}

/// Registry of listener callbacks for a single event stream.
///
/// `notify_listeners` resolves once every registered callback has completed, so a
/// single producer awaiting each notification delivers its events in order.
pub struct Publisher<T> {
    listeners: Arc<DashMap<Uuid, Callback<T>>>,
}

impl<T> Clone for Publisher<T> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
        }
    }
}

impl<T> Default for Publisher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Publisher<T> {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(DashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn contains(&self, listener_id: &Uuid) -> bool {
        self.listeners.contains_key(listener_id)
    }
}

#[async_trait]
impl<T> Publishable<T> for Publisher<T>
where
    T: Send + Sync + 'static,
{
    fn register_listener(&self, listener: &mut dyn Notifiable<T>) -> Uuid {
        let callback = listener.get_callback();
        let listener_id = Uuid::new_v4();
        listener.set_id(listener_id);
        self.listeners.insert(listener_id, callback);
        listener_id
    }

    fn unregister_all(&self) {
        self.listeners.clear();
    }

    fn unregister_listener(&self, listener_id: Uuid) -> bool {
        self.listeners.remove(&listener_id).is_some()
    }

    async fn notify_listeners(&self, data: Arc<T>) {
        // Snapshot first so no map guard is held across an await.
        let listeners: Vec<(Uuid, Callback<T>)> = self
            .listeners
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        join_all(
            listeners
                .into_iter()
                .map(|(id, callback)| callback(id, data.clone())),
        )
        .await;
    }
}
