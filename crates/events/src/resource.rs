//! Canonical resource snapshot carried in envelopes.
//!
//! Every resource kind funnels into the same [`ResourceSnapshot`] shape:
//! type information, the identifying metadata, and the `spec`/`status`
//! documents kept as opaque JSON.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference from an object to the object that owns it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OwnerReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<bool>,
}

/// Identifying metadata of one object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectMeta {
    /// Store-assigned unique id.
    pub uid: String,
    pub name: String,
    /// Empty for cluster-scoped objects.
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    /// Opaque version token of this snapshot.
    pub resource_version: String,
    pub generation: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub owner_references: Vec<OwnerReference>,
}

/// Full current state of one object, independent of its kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSnapshot {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<serde_json::Value>,
}

impl ResourceSnapshot {
    /// The object's unique id.
    pub fn uid(&self) -> &str {
        &self.metadata.uid
    }

    /// `namespace/name`, or just `name` for cluster-scoped objects.
    pub fn key(&self) -> String {
        if self.metadata.namespace.is_empty() {
            self.metadata.name.clone()
        } else {
            format!("{}/{}", self.metadata.namespace, self.metadata.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(namespace: &str, name: &str) -> ResourceSnapshot {
        ResourceSnapshot {
            api_version: "v1".to_string(),
            kind: "Pod".to_string(),
            metadata: ObjectMeta {
                uid: "1f0c".to_string(),
                name: name.to_string(),
                namespace: namespace.to_string(),
                ..ObjectMeta::default()
            },
            ..ResourceSnapshot::default()
        }
    }

    #[test]
    fn test_key_includes_namespace() {
        assert_eq!(snapshot("default", "web").key(), "default/web");
        assert_eq!(snapshot("", "node-1").key(), "node-1");
    }

    #[test]
    fn test_serializes_camel_case() {
        let value = serde_json::to_value(snapshot("default", "web"));
        let value = value.ok();
        assert_eq!(
            value.as_ref().and_then(|v| v.get("apiVersion")),
            Some(&serde_json::json!("v1"))
        );
        assert!(
            value
                .as_ref()
                .and_then(|v| v.get("metadata"))
                .and_then(|m| m.get("resourceVersion"))
                .is_some()
        );
        // Absent documents are omitted rather than serialized as null.
        assert!(value.as_ref().and_then(|v| v.get("spec")).is_none());
    }
}
