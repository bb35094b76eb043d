//! Publisher trait and implementations.

use std::io::Write;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;

use crate::envelope::EventEnvelope;
use crate::error::{Error, Result};

/// Delivers envelopes to a named subject.
///
/// Delivery is confirmed synchronously from the caller's point of view: once
/// `publish` returns `Ok`, the envelope has been handed off.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an envelope to `subject`.
    async fn publish(&self, subject: &str, envelope: EventEnvelope) -> Result<()>;
}

#[async_trait]
impl<P: EventPublisher + ?Sized> EventPublisher for Arc<P> {
    async fn publish(&self, subject: &str, envelope: EventEnvelope) -> Result<()> {
        (**self).publish(subject, envelope).await
    }
}

/// One line written by [`JsonLinesPublisher`].
#[derive(Serialize)]
struct JsonLine<'a> {
    subject: &'a str,
    envelope: &'a EventEnvelope,
}

/// Writes each envelope as one JSON line to a writer.
pub struct JsonLinesPublisher<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesPublisher<W> {
    /// Create a publisher writing to `writer`.
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the writer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if a writer panicked mid-write.
    pub fn into_inner(self) -> Result<W> {
        self.writer.into_inner().map_err(|_| Error::ChannelClosed)
    }
}

impl JsonLinesPublisher<std::io::Stdout> {
    /// Publisher writing to standard output.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

#[async_trait]
impl<W: Write + Send> EventPublisher for JsonLinesPublisher<W> {
    async fn publish(&self, subject: &str, envelope: EventEnvelope) -> Result<()> {
        let line = serde_json::to_string(&JsonLine {
            subject,
            envelope: &envelope,
        })
        .map_err(|e| Error::serialization(e.to_string()))?;

        let mut writer = self.writer.lock().map_err(|_| Error::ChannelClosed)?;
        writeln!(writer, "{line}")
            .and_then(|()| writer.flush())
            .map_err(|e| Error::publish_failed(subject, e.to_string()))
    }
}

/// A wrapper that adds tracing to a publisher.
pub struct TracingPublisher<P: EventPublisher> {
    inner: P,
}

impl<P: EventPublisher> TracingPublisher<P> {
    /// Create a new tracing publisher.
    pub const fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P: EventPublisher> EventPublisher for TracingPublisher<P> {
    async fn publish(&self, subject: &str, envelope: EventEnvelope) -> Result<()> {
        let event_id = envelope.id();
        tracing::debug!(
            subject,
            event_id = %event_id,
            event_type = %envelope.event_type(),
            object = %envelope.object().key(),
            "Publishing envelope"
        );
        let result = self.inner.publish(subject, envelope).await;
        match &result {
            Ok(()) => tracing::trace!(subject, event_id = %event_id, "Envelope published"),
            Err(e) => tracing::debug!(subject, event_id = %event_id, error = %e, "Publish failed"),
        }
        result
    }
}
