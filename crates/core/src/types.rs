//! Shared resource addressing types.

use serde::{Deserialize, Serialize};

/// Identifies a category of object in the resource store.
///
/// The core API group is the empty string, so `v1/pods` and
/// `apps/v1/deployments` are both valid renderings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupVersionResource {
    /// API group, empty for the core group.
    #[serde(default)]
    pub group: String,
    /// API version within the group.
    pub version: String,
    /// Plural resource name, e.g. `pods`.
    pub resource: String,
}

impl GroupVersionResource {
    /// Create a new group/version/resource triple.
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            resource: resource.into(),
        }
    }

    /// Shorthand for a resource in the core (empty) group.
    pub fn core(version: impl Into<String>, resource: impl Into<String>) -> Self {
        Self::new("", version, resource)
    }

    /// The `apiVersion` string objects of this resource carry.
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl std::fmt::Display for GroupVersionResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.api_version(), self.resource)
    }
}

/// Namespace scope of a listing.
///
/// An empty namespace selects every namespace, matching how cluster-wide
/// listings are addressed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
    /// Scope a listing to a single namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Scope a listing to all namespaces.
    pub fn all() -> Self {
        Self(String::new())
    }

    /// Whether this scope spans every namespace.
    pub fn is_all(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether an object living in `namespace` falls inside this scope.
    pub fn contains(&self, namespace: &str) -> bool {
        self.is_all() || self.0 == namespace
    }

    /// The raw namespace name, empty for all namespaces.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_all() {
            write!(f, "<all>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
