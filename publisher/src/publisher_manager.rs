use dashmap::DashMap;
use log::debug;
use std::cmp::Eq;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::Publishable;

use super::publisher::Publisher;
use common::traits::Notifiable;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublisherError {
    #[error("publisher {0} doesn't exist")]
    PublisherNotFound(String),

    #[error("listener {0} not found")]
    ListenerNotFound(Uuid),
}

/// Keeps one [`Publisher`] per publisher type (for instance one per sensor) and
/// remembers which publisher each listener id belongs to, so a listener can be
/// removed by id alone.
///
/// # Example
///
/// ```rust
/// use uuid::Uuid;
/// use publisher::{listener, PublisherManager};
/// use common::types::{Readings, SensorKind, StreamEvent};
/// use std::sync::Arc;
/// use tokio::runtime::Runtime;
///
/// let rt = Runtime::new().unwrap();
/// rt.block_on(async {
///     struct Printer;
///
///     impl Printer {
///         async fn handle(&self, _id: Uuid, event: Arc<StreamEvent>) {
///             println!("Event: {:?}", event);
///         }
///     }
///
///     let manager = PublisherManager::<StreamEvent, SensorKind>::new(&[SensorKind::Accelerometer]);
///
///     let printer = Arc::new(Printer);
///     let mut listener = listener!(printer.handle);
///
///     let id = manager.add_listener(&mut listener, &SensorKind::Accelerometer).unwrap();
///     manager
///         .notify_listeners(SensorKind::Accelerometer, Arc::new(StreamEvent::Completed))
///         .await;
///     manager.remove_listener(id).unwrap();
/// });
/// ```
pub struct PublisherManager<T, S> {
    publishers: Arc<DashMap<S, Publisher<T>>>,
    control: Arc<DashMap<Uuid, S>>,
}

impl<T, S> Clone for PublisherManager<T, S> {
    fn clone(&self) -> Self {
        Self {
            publishers: self.publishers.clone(),
            control: self.control.clone(),
        }
    }
}

impl<T, S> PublisherManager<T, S>
where
    T: Send + Sync + 'static,
    S: Send + Sync + Hash + Eq + Clone + Debug + Into<usize>,
{
    pub fn new(publisher_types: &[S]) -> Self {
        let collection = DashMap::<S, Publisher<T>>::new();
        for publisher_type in publisher_types {
            collection.insert(publisher_type.clone(), Publisher::new());
        }

        Self {
            publishers: Arc::new(collection),
            control: Arc::new(DashMap::new()),
        }
    }

    pub fn add_publisher(&self, publisher_type: S) {
        self.publishers
            .entry(publisher_type)
            .or_insert_with(Publisher::new);
    }

    pub fn remove_publisher(&self, publisher_type: &S) {
        if let Some((_, publisher)) = self.publishers.remove(publisher_type) {
            publisher.unregister_all();
            self.control.retain(|_, owner| owner != publisher_type);
            debug!("Removed publisher {:?}", publisher_type);
        }
    }

    pub fn get_available_publisher_types(&self) -> Vec<S> {
        let mut publisher_types: Vec<S> = self
            .publishers
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        publisher_types.sort_by_key(|publisher_type| publisher_type.clone().into());
        publisher_types
    }

    pub fn add_listener(
        &self,
        listener: &mut dyn Notifiable<T>,
        publisher_type: &S,
    ) -> Result<Uuid, PublisherError> {
        let publisher = self
            .publishers
            .get(publisher_type)
            .ok_or_else(|| PublisherError::PublisherNotFound(format!("{:?}", publisher_type)))?;
        let id = publisher.register_listener(listener);
        self.control.insert(id, publisher_type.clone());
        Ok(id)
    }

    pub fn remove_listener(&self, id: Uuid) -> Result<(), PublisherError> {
        let (_, publisher_type) = self
            .control
            .remove(&id)
            .ok_or(PublisherError::ListenerNotFound(id))?;
        let publisher = self
            .publishers
            .get(&publisher_type)
            .ok_or_else(|| PublisherError::PublisherNotFound(format!("{:?}", publisher_type)))?;
        publisher.unregister_listener(id);
        Ok(())
    }

    /// Whether `id` is still subscribed to some publisher.
    pub fn has_listener(&self, id: &Uuid) -> bool {
        self.control.contains_key(id)
    }

    pub fn listener_count(&self, publisher_type: &S) -> usize {
        self.publishers
            .get(publisher_type)
            .map(|publisher| publisher.len())
            .unwrap_or(0)
    }

    pub async fn notify_listeners(&self, publisher_type: S, data: Arc<T>) {
        // Clone out of the map so the shard lock is released before awaiting.
        let publisher = self
            .publishers
            .get(&publisher_type)
            .map(|entry| entry.value().clone());
        match publisher {
            Some(publisher) => publisher.notify_listeners(data).await,
            None => debug!("No publisher for {:?}, dropping notification", publisher_type),
        }
    }
}
