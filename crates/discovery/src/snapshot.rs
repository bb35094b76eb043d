//! Normalises raw store objects into [`ResourceSnapshot`]s.
//!
//! [`transform`] never fails: anything missing or of the wrong JSON type is
//! replaced by its default, so every object the store returns becomes
//! exactly one snapshot.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use clustersync_events::{ObjectMeta, OwnerReference, ResourceSnapshot};
use serde_json::Value;

use crate::store::RawResource;

/// Convert one raw object into the canonical snapshot shape.
pub fn transform(raw: &RawResource) -> ResourceSnapshot {
    let value = raw.as_value();
    let metadata = value.get("metadata");

    ResourceSnapshot {
        api_version: raw.api_version().to_string(),
        kind: raw.kind().to_string(),
        metadata: ObjectMeta {
            uid: raw.uid().to_string(),
            name: raw.name().to_string(),
            namespace: raw.namespace().to_string(),
            labels: string_map(metadata.and_then(|m| m.get("labels"))),
            annotations: string_map(metadata.and_then(|m| m.get("annotations"))),
            resource_version: string_at(metadata, "resourceVersion"),
            generation: metadata
                .and_then(|m| m.get("generation"))
                .and_then(Value::as_i64)
                .unwrap_or_default(),
            creation_timestamp: metadata
                .and_then(|m| m.get("creationTimestamp"))
                .and_then(Value::as_str)
                .and_then(parse_timestamp),
            owner_references: metadata
                .and_then(|m| m.get("ownerReferences"))
                .and_then(Value::as_array)
                .map(|refs| refs.iter().map(owner_reference).collect())
                .unwrap_or_default(),
        },
        spec: document(value, "spec"),
        status: document(value, "status"),
    }
}

fn string_at(value: Option<&Value>, key: &str) -> String {
    value
        .and_then(|v| v.get(key))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// String-valued entries of an object; other values are dropped.
fn string_map(value: Option<&Value>) -> BTreeMap<String, String> {
    value
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

fn owner_reference(value: &Value) -> OwnerReference {
    let value = Some(value);
    OwnerReference {
        api_version: string_at(value, "apiVersion"),
        kind: string_at(value, "kind"),
        name: string_at(value, "name"),
        uid: string_at(value, "uid"),
        controller: value
            .and_then(|v| v.get("controller"))
            .and_then(Value::as_bool),
    }
}

fn document(value: &Value, key: &str) -> Option<Value> {
    value.get(key).filter(|v| !v.is_null()).cloned()
}
