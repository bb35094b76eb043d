//! Error types for the events crate.

use thiserror::Error;

/// Result type alias for event operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Event publishing and subscription errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The bus or channel no longer accepts events.
    #[error("event channel closed")]
    ChannelClosed,

    /// Delivery to a subject failed.
    #[error("publish to '{subject}' failed: {reason}")]
    PublishFailed { subject: String, reason: String },

    /// An envelope could not be encoded.
    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    /// A slow subscriber missed envelopes.
    #[error("subscriber lagged behind by {skipped} envelopes")]
    Lagged { skipped: u64 },
}

impl Error {
    /// Create a publish failed error.
    pub fn publish_failed(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PublishFailed {
            subject: subject.into(),
            reason: reason.into(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(reason: impl Into<String>) -> Self {
        Self::Serialization {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::publish_failed("cluster.resources", "broker unavailable");
        assert!(err.to_string().contains("cluster.resources"));
        assert!(err.to_string().contains("broker unavailable"));
    }

    #[test]
    fn test_lagged_display() {
        let err = Error::Lagged { skipped: 12 };
        assert!(err.to_string().contains("12"));
    }
}
