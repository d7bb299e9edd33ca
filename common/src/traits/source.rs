use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::SourceError;
use crate::traits::Notifiable;
use crate::types::{DeviceEvent, SensorKind, StreamEvent};

/// Producer of timestamped sensor samples: an external strap, the phone's own
/// sensors, or anything that behaves like them.
///
/// Registering a listener for a sensor opens a subscription; unregistering it
/// cancels the subscription. Implementations must not call the listener from
/// within `register_listener` itself; events are delivered afterwards, in order,
/// one callback at a time per subscription.
#[async_trait]
pub trait SampleSource: Send + Sync {
    /// Returns the tag identifying this source in logs.
    fn get_tag(&self) -> &str;

    async fn connect(&self, device_id: &str) -> Result<(), SourceError>;

    async fn disconnect(&self, device_id: &str) -> Result<(), SourceError>;

    /// Returns the sensors this source can stream.
    async fn get_available_sensors(&self) -> Result<Vec<SensorKind>, SourceError>;

    /// Subscribes `listener` to the `sensor` stream of `device_id`.
    /// Returns the id that cancels the subscription.
    async fn register_listener(
        &self,
        listener: &mut dyn Notifiable<StreamEvent>,
        device_id: &str,
        sensor: SensorKind,
    ) -> Result<Uuid, SourceError>;

    /// Cancels a subscription. Unknown ids are ignored.
    async fn unregister_listener(&self, id: Uuid);

    /// Subscribes `listener` to connection and housekeeping events.
    async fn register_device_listener(&self, listener: &mut dyn Notifiable<DeviceEvent>) -> Uuid;
}
