//! Point-in-time discovery of one resource kind.
//!
//! A [`DiscoveryStep`] lists every instance of its configured resource kind
//! from a [`ResourceStore`] and republishes each instance as its own
//! `Single`/`Add` envelope through an
//! [`EventPublisher`](clustersync_events::EventPublisher).
//!
//! # Failure policy
//!
//! - The store reports the kind does not exist: the pass succeeds and
//!   publishes nothing
//! - Any other listing failure: the pass fails at [`Stage::List`]
//! - A publish failure: the pass stops at once and fails at
//!   [`Stage::Publish`]; earlier envelopes are not retracted
//!
//! Nothing is retried. Rescheduling is up to whoever drives the step.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use clustersync_core::{GroupVersionResource, ResourceTypeDescriptor};
//! use clustersync_discovery::{DiscoveryStep, InMemoryResourceStore};
//! use clustersync_events::{EventBus, EventPublisher};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(InMemoryResourceStore::new());
//!     let bus: Arc<dyn EventPublisher> = Arc::new(EventBus::new());
//!     let descriptor = ResourceTypeDescriptor::new(
//!         GroupVersionResource::core("v1", "pods"),
//!         "cluster.resources",
//!     );
//!
//!     let step = DiscoveryStep::new(descriptor, store, bus);
//!     step.run_pass().await.ok();
//! }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod snapshot;
pub mod step;
pub mod store;

// Re-export main types
pub use error::{DiscoveryError, PassOutcome, Stage};
pub use snapshot::transform;
pub use step::DiscoveryStep;
pub use store::{
    InMemoryResourceStore, ManifestResourceStore, ManifestStoreError, NotFoundCondition,
    RawResource, ResourceStore, StoreError,
};
