//! Resource store backed by a directory of manifest files.
//!
//! Every `*.yaml`, `*.yml` and `*.json` file in the directory is read on each
//! listing, so a pass always sees the directory as it is at that moment.
//! YAML files may hold several documents, and a document of kind `List`
//! contributes its `items`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use clustersync_core::{GroupVersionResource, Namespace};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::{NotFoundCondition, RawResource, ResourceStore};

/// Failures reported by [`ManifestResourceStore`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ManifestStoreError {
    /// No manifest declares an object of the requested resource kind.
    #[error("no manifests found for resource '{resource}'")]
    NotFound { resource: String },

    /// A file or the directory could not be read.
    #[error("failed to read '{path}': {reason}")]
    Io { path: PathBuf, reason: String },

    /// A file is not valid YAML or JSON.
    #[error("failed to parse '{path}': {reason}")]
    Parse { path: PathBuf, reason: String },
}

impl ManifestStoreError {
    fn io(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Io {
            path: path.into(),
            reason: reason.into(),
        }
    }

    fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl NotFoundCondition for ManifestStoreError {
    fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Serves the objects declared in a manifest directory.
#[derive(Debug, Clone)]
pub struct ManifestResourceStore {
    root: PathBuf,
}

impl ManifestResourceStore {
    /// Create a store over `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The manifest directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Manifest files in the directory, sorted by path.
    async fn manifest_paths(&self) -> Result<Vec<PathBuf>, ManifestStoreError> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| ManifestStoreError::io(&self.root, e.to_string()))?;

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ManifestStoreError::io(&self.root, e.to_string()))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| ManifestStoreError::io(&path, e.to_string()))?;
            if file_type.is_file() && is_manifest(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Every object declared in every manifest, in file then document order.
    async fn load_all(&self) -> Result<Vec<RawResource>, ManifestStoreError> {
        let mut objects = Vec::new();
        for path in self.manifest_paths().await? {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| ManifestStoreError::io(&path, e.to_string()))?;
            let documents = parse_documents(&path, &contents)?;
            debug!(path = %path.display(), documents = documents.len(), "Loaded manifest");
            objects.extend(documents.into_iter().flat_map(expand_list));
        }
        Ok(objects)
    }
}

#[async_trait]
impl ResourceStore for ManifestResourceStore {
    type Error = ManifestStoreError;

    async fn list(
        &self,
        gvr: &GroupVersionResource,
        namespace: &Namespace,
    ) -> Result<Vec<RawResource>, Self::Error> {
        let api_version = gvr.api_version();
        let of_kind: Vec<RawResource> = self
            .load_all()
            .await?
            .into_iter()
            .filter(|object| {
                object.api_version() == api_version
                    && resource_name(object.kind()) == gvr.resource
            })
            .collect();

        if of_kind.is_empty() {
            return Err(ManifestStoreError::NotFound {
                resource: gvr.to_string(),
            });
        }

        Ok(of_kind
            .into_iter()
            .filter(|object| namespace.contains(object.namespace()))
            .collect())
    }
}

fn is_manifest(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext, "yaml" | "yml" | "json"))
}

fn parse_documents(path: &Path, contents: &str) -> Result<Vec<Value>, ManifestStoreError> {
    if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
        return serde_json::from_str(contents)
            .map(|value| vec![value])
            .map_err(|e| ManifestStoreError::parse(path, e.to_string()));
    }

    serde_yaml::Deserializer::from_str(contents)
        .map(|document| {
            Value::deserialize(document).map_err(|e| ManifestStoreError::parse(path, e.to_string()))
        })
        .filter(|document| !matches!(document, Ok(Value::Null)))
        .collect()
}

/// Objects held by a document: the document itself, or a `List`'s items.
fn expand_list(document: Value) -> Vec<RawResource> {
    let is_list = document.get("kind").and_then(Value::as_str) == Some("List");
    match document {
        Value::Object(mut map) if is_list => match map.remove("items") {
            Some(Value::Array(items)) => items.into_iter().map(RawResource::new).collect(),
            _ => Vec::new(),
        },
        other => vec![RawResource::new(other)],
    }
}

/// Plural lowercase resource name for a kind, e.g. `NetworkPolicy` to
/// `networkpolicies`.
///
/// `endpoints` is already plural; every other kind ending in `s` takes `es`.
fn resource_name(kind: &str) -> String {
    let lower = kind.to_ascii_lowercase();
    if lower.ends_with("endpoints") {
        lower
    } else if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        format!("{lower}es")
    } else {
        match lower.strip_suffix('y') {
            Some(stem) if !stem.ends_with(['a', 'e', 'i', 'o', 'u']) => format!("{stem}ies"),
            _ => format!("{lower}s"),
        }
    }
}
