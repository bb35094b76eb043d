//! In-memory resource store.

use std::collections::HashMap;

use async_trait::async_trait;
use clustersync_core::{GroupVersionResource, Namespace};
use thiserror::Error;
use tokio::sync::RwLock;

use super::{NotFoundCondition, RawResource, ResourceStore};

/// Failures reported by [`InMemoryResourceStore`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The resource kind is not registered.
    #[error("the server could not find the requested resource '{resource}'")]
    NotFound { resource: String },

    /// The store could not be reached.
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },

    /// The caller may not list this resource.
    #[error("forbidden: {reason}")]
    Forbidden { reason: String },
}

impl StoreError {
    /// Create a not found error for a resource.
    pub fn not_found(gvr: &GroupVersionResource) -> Self {
        Self::NotFound {
            resource: gvr.to_string(),
        }
    }

    /// Create an unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Create a forbidden error.
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }
}

impl NotFoundCondition for StoreError {
    fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Resource store held in memory.
///
/// Only registered resource kinds can be listed; anything else reports
/// [`StoreError::NotFound`]. A failure can be injected per kind.
#[derive(Default)]
pub struct InMemoryResourceStore {
    kinds: RwLock<HashMap<GroupVersionResource, Vec<RawResource>>>,
    failures: RwLock<HashMap<GroupVersionResource, StoreError>>,
}

impl InMemoryResourceStore {
    /// Create an empty store with no registered kinds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kind with its instances, in listing order.
    #[must_use]
    pub fn with_kind(
        mut self,
        gvr: GroupVersionResource,
        items: impl IntoIterator<Item = RawResource>,
    ) -> Self {
        self.kinds
            .get_mut()
            .entry(gvr)
            .or_default()
            .extend(items);
        self
    }

    /// Append an instance, registering its kind if needed.
    pub async fn insert(&self, gvr: GroupVersionResource, item: RawResource) {
        self.kinds.write().await.entry(gvr).or_default().push(item);
    }

    /// Forget a kind and all of its instances.
    pub async fn remove_kind(&self, gvr: &GroupVersionResource) {
        self.kinds.write().await.remove(gvr);
    }

    /// Make every listing of `gvr` fail with `error` until cleared.
    pub async fn fail_with(&self, gvr: GroupVersionResource, error: StoreError) {
        self.failures.write().await.insert(gvr, error);
    }

    /// Clear an injected failure.
    pub async fn clear_failure(&self, gvr: &GroupVersionResource) {
        self.failures.write().await.remove(gvr);
    }
}

#[async_trait]
impl ResourceStore for InMemoryResourceStore {
    type Error = StoreError;

    async fn list(
        &self,
        gvr: &GroupVersionResource,
        namespace: &Namespace,
    ) -> Result<Vec<RawResource>, Self::Error> {
        if let Some(error) = self.failures.read().await.get(gvr) {
            return Err(error.clone());
        }

        let kinds = self.kinds.read().await;
        let items = kinds.get(gvr).ok_or_else(|| StoreError::not_found(gvr))?;

        Ok(items
            .iter()
            .filter(|item| namespace.contains(item.namespace()))
            .cloned()
            .collect())
    }
}
