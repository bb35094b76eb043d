//! CLI command definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// clustersync - cluster resource discovery
#[derive(Parser, Debug)]
#[command(name = "clustersync")]
#[command(version)]
#[command(about = "Discover cluster resources and republish them as events")]
#[command(
    long_about = "clustersync lists every instance of each configured resource kind and publishes one Add event per object. Events are written to stdout as JSON lines."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one discovery pass per configured resource kind
    Discover {
        /// Directory of YAML/JSON manifests to discover from
        #[arg(short, long)]
        manifests: PathBuf,

        /// Discovery config file (.yaml, .yml or .toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Check a discovery config file without running anything
    ValidateConfig {
        /// Config file path
        file: PathBuf,
    },
}
