//! The discovery step.

use std::sync::Arc;

use async_trait::async_trait;
use clustersync_core::{
    DiscoveryConfig, GroupVersionResource, ResourceTypeDescriptor, Step, StepError,
};
use clustersync_events::{EventEnvelope, EventPublisher};
use tracing::{debug, error, info};

use crate::error::{DiscoveryError, PassOutcome};
use crate::snapshot;
use crate::store::{NotFoundCondition, ResourceStore};

/// Lists every instance of one resource kind and publishes each as a
/// `Single`/`Add` envelope.
///
/// The step keeps no state between passes besides its configuration. Each
/// pass is a fresh, complete listing; nothing is diffed against earlier
/// passes, so unchanged objects are announced again every time.
pub struct DiscoveryStep<S> {
    name: String,
    descriptor: ResourceTypeDescriptor,
    gvr: GroupVersionResource,
    store: Arc<S>,
    publisher: Arc<dyn EventPublisher>,
}

impl<S: ResourceStore> DiscoveryStep<S> {
    /// Create a step for `descriptor`.
    pub fn new(
        descriptor: ResourceTypeDescriptor,
        store: Arc<S>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        let gvr = descriptor.gvr();
        let name = format!("discover:{gvr}");
        Self {
            name,
            descriptor,
            gvr,
            store,
            publisher,
        }
    }

    /// One step per configured resource, sharing the store and publisher.
    pub fn from_config(
        config: &DiscoveryConfig,
        store: &Arc<S>,
        publisher: &Arc<dyn EventPublisher>,
    ) -> Vec<Self> {
        config
            .resources
            .iter()
            .map(|descriptor| {
                Self::new(descriptor.clone(), Arc::clone(store), Arc::clone(publisher))
            })
            .collect()
    }

    /// The resource kind this step discovers.
    pub const fn descriptor(&self) -> &ResourceTypeDescriptor {
        &self.descriptor
    }

    /// Run one discovery pass.
    ///
    /// A resource kind the store does not know is not a failure: the pass
    /// succeeds without publishing. The first publish failure ends the pass;
    /// envelopes already published stay published.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscoveryError`] at stage `List` if the listing fails for
    /// any other reason, or at stage `Publish` if an envelope is rejected.
    pub async fn run_pass(&self) -> PassOutcome {
        let resource = self.descriptor.label();
        let subject = self.descriptor.publish_subject.as_str();

        info!(
            resource,
            gvr = %self.gvr,
            namespace = %self.descriptor.namespace,
            "Discovering resources"
        );

        let items = match self.store.list(&self.gvr, &self.descriptor.namespace).await {
            Ok(items) => items,
            Err(e) if e.is_not_found() => {
                info!(resource, gvr = %self.gvr, "Resource kind not present in store, skipping");
                return Ok(());
            }
            Err(e) => {
                error!(resource, gvr = %self.gvr, error = %e, "Failed to list resources");
                return Err(DiscoveryError::list(resource, e));
            }
        };

        let total = items.len();
        for (published, item) in items.iter().enumerate() {
            let envelope = EventEnvelope::added(snapshot::transform(item));
            if let Err(e) = self.publisher.publish(subject, envelope).await {
                error!(
                    resource,
                    subject,
                    published,
                    total,
                    object = item.name(),
                    error = %e,
                    "Failed to publish resource"
                );
                return Err(DiscoveryError::publish(resource, e));
            }
        }

        debug!(resource, subject, published = total, "Discovery pass complete");
        Ok(())
    }
}

#[async_trait]
impl<S: ResourceStore + 'static> Step for DiscoveryStep<S> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Result<(), StepError> {
        self.run_pass()
            .await
            .map_err(|e| StepError::new(self.name(), e))
    }

    fn cancel(&self) -> Result<(), StepError> {
        // Passes are not interruptible; the in-flight pass runs to completion.
        debug!(step = %self.name, "cancel step");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use crate::store::{InMemoryResourceStore, RawResource, StoreError};
    use clustersync_events::{EventBus, EventKind, ObjectScope};
    use serde_json::json;

    fn pods() -> GroupVersionResource {
        GroupVersionResource::core("v1", "pods")
    }

    fn pod(name: &str) -> RawResource {
        RawResource::new(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"name": name, "namespace": "default", "uid": format!("uid-{name}")}
        }))
    }

    fn step(
        store: InMemoryResourceStore,
        bus: &Arc<EventBus>,
    ) -> DiscoveryStep<InMemoryResourceStore> {
        let publisher: Arc<dyn EventPublisher> = Arc::clone(bus) as Arc<dyn EventPublisher>;
        DiscoveryStep::new(
            ResourceTypeDescriptor::new(pods(), "cluster.pods").in_namespace("default"),
            Arc::new(store),
            publisher,
        )
    }

    #[tokio::test]
    async fn test_publishes_each_listed_object() {
        let bus = Arc::new(EventBus::new());
        let mut sub = bus.subscribe_subject("cluster.pods").await;
        let store = InMemoryResourceStore::new().with_kind(pods(), [pod("a"), pod("b")]);

        step(store, &bus).run_pass().await.unwrap();

        for expected in ["uid-a", "uid-b"] {
            let delivery = sub.try_recv().unwrap().expect("pending delivery");
            assert_eq!(delivery.envelope.object().uid(), expected);
            assert_eq!(delivery.envelope.object_type(), ObjectScope::Single);
            assert_eq!(delivery.envelope.event_type(), EventKind::Add);
        }
        assert_eq!(bus.published_count(), 2);
    }

    #[tokio::test]
    async fn test_list_failure_is_list_stage() {
        let bus = Arc::new(EventBus::new());
        let store = InMemoryResourceStore::new().with_kind(pods(), [pod("a")]);
        store.fail_with(pods(), StoreError::unavailable("connection refused")).await;

        let err = step(store, &bus).run_pass().await.unwrap_err();
        assert_eq!(err.stage(), Stage::List);
        assert_eq!(err.resource(), "pods");
        assert!(err.cause::<StoreError>().is_some());
        assert_eq!(bus.published_count(), 0);
    }

    #[tokio::test]
    async fn test_closed_bus_is_publish_stage() {
        let bus = Arc::new(EventBus::new());
        bus.close();
        let store = InMemoryResourceStore::new().with_kind(pods(), [pod("a")]);

        let err = step(store, &bus).run_pass().await.unwrap_err();
        assert_eq!(err.stage(), Stage::Publish);
    }

    #[tokio::test]
    async fn test_step_capability() {
        let bus = Arc::new(EventBus::new());
        let store = InMemoryResourceStore::new();
        let step: Box<dyn Step> = Box::new(step(store, &bus));

        assert_eq!(step.name(), "discover:v1/pods");
        assert!(step.execute().await.is_ok());
        assert!(step.cancel().is_ok());
    }

    #[tokio::test]
    async fn test_step_error_carries_discovery_error() {
        let bus = Arc::new(EventBus::new());
        bus.close();
        let store = InMemoryResourceStore::new().with_kind(pods(), [pod("a")]);
        let step = step(store, &bus);

        let err = step.execute().await.unwrap_err();
        assert_eq!(err.step(), "discover:v1/pods");
        assert_eq!(
            err.downcast_ref::<DiscoveryError>().map(DiscoveryError::stage),
            Some(Stage::Publish)
        );
    }

    #[test]
    fn test_from_config_builds_one_step_per_resource() {
        let config = DiscoveryConfig::default();
        let store = Arc::new(InMemoryResourceStore::new());
        let publisher: Arc<dyn EventPublisher> = Arc::new(EventBus::new());

        let steps = DiscoveryStep::from_config(&config, &store, &publisher);
        assert_eq!(steps.len(), config.resources.len());
        assert_eq!(
            steps.first().map(|s| s.descriptor().resource.as_str()),
            Some("namespaces")
        );
    }
}
