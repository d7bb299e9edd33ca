//! # Crate publisher
//!
//! ## publisher
//!
//! The `publisher` crate provides the two fan-out mechanisms used between sensor
//! sources, stream sessions and consumers:
//!
//! - [`Publisher`] / [`PublisherManager`]: registries of asynchronous listener
//!   callbacks, keyed by id, that a source notifies with every new event.
//! - [`Observable`]: a single-writer cell holding the latest value of some state.
//!   Readers take point-in-time snapshots or wait for the next change; the writer
//!   never waits for them.
//!
//! ### Example
//!
//! ```ignore
//! let publisher = Publisher::new();
//! let mut listener = Listener::new(|_id, value: Arc<u32>| async move {
//!     println!("Listener received: {}", value);
//! });
//!
//! let listener_id = publisher.register_listener(&mut listener);
//! publisher.notify_listeners(Arc::new(42)).await;
//! publisher.unregister_listener(listener_id);
//! assert!(publisher.is_empty());
//! ```

pub mod listener;
pub mod macros;
pub mod observable;
pub mod publisher;
pub mod publisher_manager;

pub use listener::Listener;
pub use observable::Observable;
pub use publisher::{Publishable, Publisher};
pub use publisher_manager::{PublisherError, PublisherManager};
