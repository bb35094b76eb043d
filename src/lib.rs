//! # clustersync
//!
//! Point-in-time discovery of cluster resources, republished as events.
//!
//! The binary wires the workspace crates together: a manifest directory
//! stands in for the cluster, one discovery step runs per configured
//! resource kind, and every discovered object is written to stdout as a
//! JSON line.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod cli;
pub mod commands;

pub use clustersync_core;
pub use clustersync_discovery;
pub use clustersync_events;
