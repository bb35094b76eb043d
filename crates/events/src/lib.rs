//! Event envelopes and publishers for clustersync.
//!
//! - **Snapshots**: [`ResourceSnapshot`] is the one payload shape every
//!   resource kind is normalised into
//! - **Envelopes**: [`EventEnvelope`] wraps a snapshot with its scope, kind
//!   and id
//! - **Publishers**: [`EventPublisher`] delivers envelopes to a subject;
//!   [`EventBus`] does so in-process, [`JsonLinesPublisher`] writes them out
//!
//! # Example
//!
//! ```ignore
//! use clustersync_events::{EventBus, EventEnvelope, EventPublisher, ResourceSnapshot};
//!
//! #[tokio::main]
//! async fn main() {
//!     let bus = EventBus::new();
//!     let mut sub = bus.subscribe_subject("cluster.resources").await;
//!
//!     bus.publish("cluster.resources", EventEnvelope::added(ResourceSnapshot::default()))
//!         .await
//!         .ok();
//!
//!     if let Ok(delivery) = sub.recv().await {
//!         println!("{} {}", delivery.subject, delivery.envelope.event_type());
//!     }
//! }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod bus;
pub mod envelope;
pub mod error;
pub mod publisher;
pub mod resource;
pub mod types;

// Re-export main types
pub use bus::{Delivery, EventBus, EventBusBuilder, EventSubscription, SubjectPattern};
pub use envelope::{EventEnvelope, EventKind, ObjectScope};
pub use error::{Error, Result};
pub use publisher::{EventPublisher, JsonLinesPublisher, TracingPublisher};
pub use resource::{ObjectMeta, OwnerReference, ResourceSnapshot};
pub use types::EventId;
