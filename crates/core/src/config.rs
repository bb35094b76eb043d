//! Discovery configuration.
//!
//! A configuration file lists the resource kinds to discover. Each entry is
//! a [`ResourceTypeDescriptor`] and becomes one discovery step:
//!
//! ```yaml
//! resources:
//!   - group: apps
//!     version: v1
//!     resource: deployments
//!     namespace: default
//!     publish_subject: cluster.resources
//! ```
//!
//! TOML files use the same shape under `[[resources]]` tables.

use std::path::Path;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{GroupVersionResource, Namespace};

/// Subject the built-in configuration publishes to.
pub const DEFAULT_PUBLISH_SUBJECT: &str = "cluster.resources";

/// Immutable description of one resource kind to discover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTypeDescriptor {
    /// Optional label used in logs instead of the resource name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// API group, empty for the core group.
    #[serde(default)]
    pub group: String,
    /// API version.
    pub version: String,
    /// Plural resource name.
    pub resource: String,
    /// Namespace scope, empty for all namespaces.
    #[serde(default)]
    pub namespace: Namespace,
    /// Destination channel for discovered objects.
    pub publish_subject: String,
}

impl ResourceTypeDescriptor {
    /// Create a descriptor scoped to all namespaces.
    pub fn new(gvr: GroupVersionResource, publish_subject: impl Into<String>) -> Self {
        Self {
            name: None,
            group: gvr.group,
            version: gvr.version,
            resource: gvr.resource,
            namespace: Namespace::all(),
            publish_subject: publish_subject.into(),
        }
    }

    /// Restrict the descriptor to a namespace.
    #[must_use]
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Namespace::new(namespace);
        self
    }

    /// Attach a display label.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The group/version/resource this descriptor addresses.
    pub fn gvr(&self) -> GroupVersionResource {
        GroupVersionResource::new(&self.group, &self.version, &self.resource)
    }

    /// Label for logs and errors: the configured name, or the resource.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.resource)
    }

    /// Check the descriptor for missing required fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the first empty field.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("version", &self.version),
            ("resource", &self.resource),
            ("publish_subject", &self.publish_subject),
        ];
        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(Error::invalid_config(format!(
                "resource '{}' has an empty {field}",
                self.gvr()
            ))),
            None => Ok(()),
        }
    }
}

/// The full set of resource kinds a discovery run covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Resource kinds, discovered in this order.
    pub resources: Vec<ResourceTypeDescriptor>,
}

impl DiscoveryConfig {
    /// Load and validate a configuration file.
    ///
    /// The format follows the extension: `.yaml`/`.yml` or `.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, has an unknown
    /// extension, fails to parse, or fails validation.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::file_read_failed(path, e.to_string()))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let config: Self = match extension.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| Error::yaml_parse_failed(path, e.to_string()))?,
            "toml" => toml::from_str(&contents)
                .map_err(|e| Error::toml_parse_failed(path, e.to_string()))?,
            other => return Err(Error::unsupported_format(path, other)),
        };

        tracing::debug!(
            path = %path.display(),
            resources = config.resources.len(),
            "Loaded discovery configuration"
        );

        config.validate()?;
        Ok(config)
    }

    /// Validate every descriptor and the set as a whole.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the list is empty, a descriptor
    /// is incomplete, or the same resource and namespace appear twice.
    pub fn validate(&self) -> Result<()> {
        if self.resources.is_empty() {
            return Err(Error::invalid_config("no resources configured"));
        }

        self.resources
            .iter()
            .try_for_each(ResourceTypeDescriptor::validate)?;

        match self
            .resources
            .iter()
            .map(|r| (r.gvr(), r.namespace.clone()))
            .duplicates()
            .next()
        {
            Some((gvr, namespace)) => Err(Error::invalid_config(format!(
                "resource '{gvr}' in namespace '{namespace}' is configured more than once"
            ))),
            None => Ok(()),
        }
    }
}

impl Default for DiscoveryConfig {
    /// Common cluster kinds, all namespaces, one shared subject.
    fn default() -> Self {
        let resources = [
            GroupVersionResource::core("v1", "namespaces"),
            GroupVersionResource::core("v1", "nodes"),
            GroupVersionResource::core("v1", "pods"),
            GroupVersionResource::core("v1", "services"),
            GroupVersionResource::core("v1", "configmaps"),
            GroupVersionResource::new("apps", "v1", "deployments"),
        ]
        .into_iter()
        .map(|gvr| ResourceTypeDescriptor::new(gvr, DEFAULT_PUBLISH_SUBJECT))
        .collect();

        Self { resources }
    }
}
