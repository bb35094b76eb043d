//! Event envelopes handed to publishers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::resource::ResourceSnapshot;
use crate::types::EventId;

/// Whether an envelope carries one object or a whole listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectScope {
    Single,
    List,
}

/// What happened to the carried object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The object exists; also used to re-announce current state.
    Add,
    Update,
    Delete,
    Error,
}

impl EventKind {
    /// Lowercase name used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit sent to a publisher.
///
/// Envelopes are immutable once built and are moved into the publisher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    id: EventId,
    object_type: ObjectScope,
    event_type: EventKind,
    object: ResourceSnapshot,
    created_at: DateTime<Utc>,
}

impl EventEnvelope {
    /// Build an envelope with a fresh id.
    pub fn new(object_type: ObjectScope, event_type: EventKind, object: ResourceSnapshot) -> Self {
        Self {
            id: EventId::new(),
            object_type,
            event_type,
            object,
            created_at: Utc::now(),
        }
    }

    /// A single object that currently exists.
    pub fn added(object: ResourceSnapshot) -> Self {
        Self::new(ObjectScope::Single, EventKind::Add, object)
    }

    /// Unique id of this envelope.
    pub const fn id(&self) -> EventId {
        self.id
    }

    /// Whether the envelope carries one object or a list.
    pub const fn object_type(&self) -> ObjectScope {
        self.object_type
    }

    /// What happened to the object.
    pub const fn event_type(&self) -> EventKind {
        self.event_type
    }

    /// The carried snapshot.
    pub const fn object(&self) -> &ResourceSnapshot {
        &self.object
    }

    /// When the envelope was built.
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Take the carried snapshot.
    pub fn into_object(self) -> ResourceSnapshot {
        self.object
    }
}
