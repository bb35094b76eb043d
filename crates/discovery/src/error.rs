//! Error types for discovery passes.

use clustersync_core::BoxError;
use thiserror::Error;

/// Outcome of one discovery pass.
pub type PassOutcome = std::result::Result<(), DiscoveryError>;

/// Where in a pass a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Listing the resource kind from the store.
    List,
    /// Publishing one of the listed objects.
    Publish,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::List => f.write_str("list"),
            Self::Publish => f.write_str("publish"),
        }
    }
}

/// A pass that ended early.
#[derive(Debug, Error)]
#[error("failed to {stage} resource '{resource}': {source}")]
pub struct DiscoveryError {
    stage: Stage,
    resource: String,
    #[source]
    source: BoxError,
}

impl DiscoveryError {
    /// Create a list stage failure.
    pub fn list(resource: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            stage: Stage::List,
            resource: resource.into(),
            source: source.into(),
        }
    }

    /// Create a publish stage failure.
    pub fn publish(resource: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            stage: Stage::Publish,
            resource: resource.into(),
            source: source.into(),
        }
    }

    /// The stage the pass failed in.
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// The resource kind the pass was discovering.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Recover the underlying cause, if it is an `E`.
    pub fn cause<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.downcast_ref::<E>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clustersync_events::Error as EventError;

    #[test]
    fn test_display_names_stage_and_resource() {
        let err = DiscoveryError::publish("pods", EventError::ChannelClosed);
        assert_eq!(
            err.to_string(),
            "failed to publish resource 'pods': event channel closed"
        );
        assert_eq!(err.stage(), Stage::Publish);
        assert_eq!(err.cause::<EventError>(), Some(&EventError::ChannelClosed));
    }
}
