//! Resource store contract and implementations.
//!
//! A store answers one question: what instances of this resource kind exist
//! right now in this namespace scope. Failures carry a
//! [`NotFoundCondition`] capability so callers can tell "this kind does not
//! exist" apart from every other failure without knowing the concrete error
//! type.

mod manifest;
mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use clustersync_core::{GroupVersionResource, Namespace};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use manifest::{ManifestResourceStore, ManifestStoreError};
pub use memory::{InMemoryResourceStore, StoreError};

/// Capability query on store errors.
pub trait NotFoundCondition {
    /// Whether the error means the requested resource kind does not exist.
    fn is_not_found(&self) -> bool;
}

/// Lists the current instances of a resource kind.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Failure type; must report whether it is a not-found condition.
    type Error: std::error::Error + NotFoundCondition + Send + Sync + 'static;

    /// Return every instance of `gvr` inside `namespace`, in store order.
    async fn list(
        &self,
        gvr: &GroupVersionResource,
        namespace: &Namespace,
    ) -> Result<Vec<RawResource>, Self::Error>;
}

#[async_trait]
impl<S: ResourceStore + ?Sized> ResourceStore for Arc<S> {
    type Error = S::Error;

    async fn list(
        &self,
        gvr: &GroupVersionResource,
        namespace: &Namespace,
    ) -> Result<Vec<RawResource>, Self::Error> {
        (**self).list(gvr, namespace).await
    }
}

/// One object exactly as the store returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawResource(Value);

impl RawResource {
    /// Wrap a raw document.
    pub const fn new(value: Value) -> Self {
        Self(value)
    }

    /// The raw document.
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Unwrap into the raw document.
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Top-level `kind`, empty if absent.
    pub fn kind(&self) -> &str {
        self.str_at(&["kind"])
    }

    /// Top-level `apiVersion`, empty if absent.
    pub fn api_version(&self) -> &str {
        self.str_at(&["apiVersion"])
    }

    /// `metadata.name`, empty if absent.
    pub fn name(&self) -> &str {
        self.str_at(&["metadata", "name"])
    }

    /// `metadata.namespace`, empty for cluster-scoped objects.
    pub fn namespace(&self) -> &str {
        self.str_at(&["metadata", "namespace"])
    }

    /// `metadata.uid`, empty if absent.
    pub fn uid(&self) -> &str {
        self.str_at(&["metadata", "uid"])
    }

    fn str_at(&self, path: &[&str]) -> &str {
        path.iter()
            .try_fold(&self.0, |value, key| value.get(key))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

impl From<Value> for RawResource {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
