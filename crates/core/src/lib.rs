//! Core types, configuration and the step capability for clustersync.
//!
//! - **Addressing**: [`GroupVersionResource`] and [`Namespace`] identify what
//!   a discovery pass lists
//! - **Configuration**: [`DiscoveryConfig`] loads the resource kinds to
//!   discover from YAML or TOML
//! - **Steps**: [`Step`] is the only surface a pipeline engine depends on

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod config;
pub mod error;
pub mod step;
pub mod types;

pub use config::{DEFAULT_PUBLISH_SUBJECT, DiscoveryConfig, ResourceTypeDescriptor};
pub use error::{Error, Result};
pub use step::{BoxError, Step, StepError};
pub use types::{GroupVersionResource, Namespace};
