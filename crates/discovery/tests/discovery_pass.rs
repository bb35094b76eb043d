//! Behavioral tests for discovery passes.
//!
//! These tests verify that:
//! - Every listed object is published exactly once as a Single/Add envelope
//! - A missing resource kind is a successful, empty pass
//! - List failures publish nothing and fail at the List stage
//! - The first publish failure stops the pass at the Publish stage

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use clustersync_core::{GroupVersionResource, ResourceTypeDescriptor};
use clustersync_discovery::{DiscoveryStep, InMemoryResourceStore, RawResource, Stage, StoreError};
use clustersync_events::{
    Error as EventError, EventEnvelope, EventKind, EventPublisher, ObjectScope,
};
use proptest::prelude::*;
use serde_json::json;

/// Publisher that records every call and fails the `fail_at`-th one
/// (1-indexed).
#[derive(Default)]
struct RecordingPublisher {
    calls: Mutex<Vec<(String, EventEnvelope)>>,
    fail_at: Option<usize>,
}

impl RecordingPublisher {
    fn failing_at(call: usize) -> Self {
        Self {
            fail_at: Some(call),
            ..Self::default()
        }
    }

    fn attempts(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Envelopes that were accepted, i.e. every call except a failed one.
    fn delivered(&self) -> Vec<(String, EventEnvelope)> {
        let calls = self.calls.lock().unwrap();
        calls
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(i + 1) != self.fail_at)
            .map(|(_, call)| call.clone())
            .collect()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(
        &self,
        subject: &str,
        envelope: EventEnvelope,
    ) -> clustersync_events::Result<()> {
        let mut calls = self.calls.lock().unwrap();
        calls.push((subject.to_string(), envelope));
        if Some(calls.len()) == self.fail_at {
            return Err(EventError::publish_failed(subject, "broker unavailable"));
        }
        Ok(())
    }
}

fn pods() -> GroupVersionResource {
    GroupVersionResource::core("v1", "pods")
}

fn pod(index: usize) -> RawResource {
    RawResource::new(json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {
            "name": format!("pod-{index}"),
            "namespace": "default",
            "uid": format!("uid-{index}"),
            "resourceVersion": format!("{}", 100 + index)
        },
        "spec": {"containers": [{"name": "app", "image": "nginx"}]}
    }))
}

fn pod_step(
    store: InMemoryResourceStore,
    publisher: &Arc<RecordingPublisher>,
) -> DiscoveryStep<InMemoryResourceStore> {
    DiscoveryStep::new(
        ResourceTypeDescriptor::new(pods(), "cluster.pods")
            .in_namespace("default")
            .with_name("Pod"),
        Arc::new(store),
        Arc::clone(publisher) as Arc<dyn EventPublisher>,
    )
}

/// # GIVEN
/// A store with 3 Pods in namespace "default"
///
/// # WHEN
/// A pass runs and every publish succeeds
///
/// # THEN
/// 3 Single/Add envelopes are published, each carrying its pod's uid
#[tokio::test]
async fn test_three_pods_are_published() {
    let raw: Vec<RawResource> = (0..3).map(pod).collect();
    let store = InMemoryResourceStore::new().with_kind(pods(), raw.clone());
    let publisher = Arc::new(RecordingPublisher::default());

    let outcome = pod_step(store, &publisher).run_pass().await;

    assert!(outcome.is_ok());
    let delivered = publisher.delivered();
    assert_eq!(delivered.len(), 3);
    for ((subject, envelope), raw) in delivered.iter().zip(&raw) {
        assert_eq!(subject, "cluster.pods");
        assert_eq!(envelope.object_type(), ObjectScope::Single);
        assert_eq!(envelope.event_type(), EventKind::Add);
        assert_eq!(envelope.object().uid(), raw.uid());
        assert_eq!(envelope.object().metadata.name, raw.name());
    }
}

#[tokio::test]
async fn test_empty_listing_publishes_nothing() {
    let store = InMemoryResourceStore::new().with_kind(pods(), []);
    let publisher = Arc::new(RecordingPublisher::default());

    let outcome = pod_step(store, &publisher).run_pass().await;

    assert!(outcome.is_ok());
    assert_eq!(publisher.attempts(), 0);
}

#[tokio::test]
async fn test_missing_kind_is_success() {
    // Nothing registered: the store reports the kind as not found.
    let store = InMemoryResourceStore::new();
    let publisher = Arc::new(RecordingPublisher::default());

    let outcome = pod_step(store, &publisher).run_pass().await;

    assert!(outcome.is_ok());
    assert_eq!(publisher.attempts(), 0);
}

#[tokio::test]
async fn test_not_found_wins_over_other_state() {
    let store = InMemoryResourceStore::new().with_kind(pods(), (0..4).map(pod));
    store.fail_with(pods(), StoreError::not_found(&pods())).await;
    let publisher = Arc::new(RecordingPublisher::default());

    let outcome = pod_step(store, &publisher).run_pass().await;

    assert!(outcome.is_ok());
    assert_eq!(publisher.attempts(), 0);
}

#[tokio::test]
async fn test_list_failure_publishes_nothing() {
    for failure in [
        StoreError::unavailable("connection refused"),
        StoreError::forbidden("pods is forbidden"),
    ] {
        let store = InMemoryResourceStore::new().with_kind(pods(), (0..2).map(pod));
        store.fail_with(pods(), failure.clone()).await;
        let publisher = Arc::new(RecordingPublisher::default());

        let err = pod_step(store, &publisher).run_pass().await.unwrap_err();

        assert_eq!(err.stage(), Stage::List);
        assert_eq!(err.resource(), "Pod");
        assert_eq!(err.cause::<StoreError>(), Some(&failure));
        assert_eq!(publisher.attempts(), 0);
    }
}

#[tokio::test]
async fn test_publish_failure_stops_the_pass() {
    let store = InMemoryResourceStore::new().with_kind(pods(), (0..5).map(pod));
    let publisher = Arc::new(RecordingPublisher::failing_at(2));

    let err = pod_step(store, &publisher).run_pass().await.unwrap_err();

    assert_eq!(err.stage(), Stage::Publish);
    assert!(err.cause::<EventError>().is_some());
    assert_eq!(publisher.attempts(), 2, "no publish after the failed one");
    assert_eq!(publisher.delivered().len(), 1);
}

#[tokio::test]
async fn test_repeated_passes_announce_the_same_objects() {
    let store = Arc::new(InMemoryResourceStore::new().with_kind(pods(), (0..3).map(pod)));
    let publisher = Arc::new(RecordingPublisher::default());
    let step = DiscoveryStep::new(
        ResourceTypeDescriptor::new(pods(), "cluster.pods"),
        store,
        Arc::clone(&publisher) as Arc<dyn EventPublisher>,
    );

    step.run_pass().await.unwrap();
    step.run_pass().await.unwrap();

    let delivered = publisher.delivered();
    assert_eq!(delivered.len(), 6);
    let (first, second) = delivered.split_at(3);
    for ((_, a), (_, b)) in first.iter().zip(second) {
        assert_eq!(a.object().uid(), b.object().uid());
        assert_eq!(a.object(), b.object());
        assert_eq!(b.event_type(), EventKind::Add);
        assert_ne!(a.id(), b.id(), "each pass builds fresh envelopes");
    }
}

fn run<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
        .block_on(future)
}

proptest! {
    /// Property: N listed objects produce exactly N Single/Add publishes.
    #[test]
    fn prop_publishes_once_per_object(count in 0usize..40) {
        let store = InMemoryResourceStore::new().with_kind(pods(), (0..count).map(pod));
        let publisher = Arc::new(RecordingPublisher::default());

        let outcome = run(pod_step(store, &publisher).run_pass());

        prop_assert!(outcome.is_ok());
        let delivered = publisher.delivered();
        prop_assert_eq!(delivered.len(), count);
        let all_single_add = delivered
            .iter()
            .all(|(_, e)| e.object_type() == ObjectScope::Single && e.event_type() == EventKind::Add);
        prop_assert!(all_single_add);
    }

    /// Property: when the k-th publish fails, k-1 envelopes were delivered
    /// and no further publish was attempted.
    #[test]
    fn prop_publish_failure_aborts_at_k(
        (total, k) in (1usize..30).prop_flat_map(|m| (Just(m), 1..=m))
    ) {
        let store = InMemoryResourceStore::new().with_kind(pods(), (0..total).map(pod));
        let publisher = Arc::new(RecordingPublisher::failing_at(k));

        let outcome = run(pod_step(store, &publisher).run_pass());

        prop_assert_eq!(outcome.map_err(|e| e.stage()), Err(Stage::Publish));
        prop_assert_eq!(publisher.attempts(), k);
        prop_assert_eq!(publisher.delivered().len(), k - 1);
    }
}
