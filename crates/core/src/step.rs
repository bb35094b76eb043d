//! The step capability a pipeline engine drives.
//!
//! An engine only ever sees `dyn Step`: it calls [`Step::execute`] once per
//! scheduling and may call [`Step::cancel`] at any time. What a failed
//! execution means for the rest of the pipeline is the engine's decision.

use async_trait::async_trait;
use thiserror::Error;

/// Boxed cause carried by a [`StepError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure reported by a step to its engine.
#[derive(Debug, Error)]
#[error("step '{step}' failed: {source}")]
pub struct StepError {
    step: String,
    #[source]
    source: BoxError,
}

impl StepError {
    /// Wrap a typed cause for the named step.
    pub fn new(step: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            step: step.into(),
            source: source.into(),
        }
    }

    /// Name of the step that failed.
    pub fn step(&self) -> &str {
        &self.step
    }

    /// Recover the typed cause, if it is an `E`.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.downcast_ref::<E>()
    }
}

/// A unit of work in a pipeline.
#[async_trait]
pub trait Step: Send + Sync {
    /// Stable name used in logs and errors.
    fn name(&self) -> &str;

    /// Run the step to completion.
    async fn execute(&self) -> Result<(), StepError>;

    /// Ask the step to stop. Steps that cannot be interrupted treat this as
    /// advisory and return `Ok(())`.
    fn cancel(&self) -> Result<(), StepError>;
}
