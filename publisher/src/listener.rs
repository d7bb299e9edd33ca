use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use uuid::Uuid;

use common::traits::Notifiable;
use common::types::Callback;

/// Asynchronous callback registered with a publisher.
pub struct Listener<T> {
    callback: Callback<T>,
    id: Option<Uuid>,
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            callback: self.callback.clone(),
            id: self.id,
        }
    }
}

impl<T> Listener<T>
where
    T: Send + Sync + 'static,
{
    pub fn new<F, Fut>(callback: F) -> Self
    where
        F: Fn(Uuid, Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let callback = Arc::new(move |id: Uuid, data: Arc<T>| {
            let fut = callback(id, data);
            Box::pin(fut) as Pin<Box<dyn Future<Output = ()> + Send>>
        });

        Listener { callback, id: None }
    }
}

impl<T> Notifiable<T> for Listener<T>
where
    T: Send + Sync,
{
    fn get_callback(&self) -> Callback<T> {
        self.callback.clone()
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = Some(id);
    }

    fn get_id(&self) -> Option<Uuid> {
        self.id
    }
}
