//! CLI command handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clustersync_core::{DiscoveryConfig, Step};
use clustersync_discovery::{DiscoveryStep, ManifestResourceStore};
use clustersync_events::{EventPublisher, JsonLinesPublisher, TracingPublisher};
use tracing::{error, info};

use crate::cli::Commands;

/// Execute a CLI command.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded or any discovery step
/// failed.
pub async fn execute_command(command: Commands) -> Result<()> {
    match command {
        Commands::Discover { manifests, config } => cmd_discover(manifests, config).await,
        Commands::ValidateConfig { file } => cmd_validate_config(&file),
    }
}

/// Result of running every configured step once.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    pub succeeded: Vec<String>,
    /// Step name and rendered error for each failed step.
    pub failed: Vec<(String, String)>,
}

impl DiscoveryReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Load the config at `path`, or the default resource set when absent.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or validated.
pub fn load_config(path: Option<&Path>) -> Result<DiscoveryConfig> {
    match path {
        Some(path) => DiscoveryConfig::from_path(path)
            .with_context(|| format!("Failed to load config '{}'", path.display())),
        None => Ok(DiscoveryConfig::default()),
    }
}

/// Run one pass per configured resource against the manifests in
/// `manifests`.
///
/// Every step runs even if an earlier one failed.
pub async fn run_discovery(
    config: &DiscoveryConfig,
    manifests: &Path,
    publisher: Arc<dyn EventPublisher>,
) -> DiscoveryReport {
    let store = Arc::new(ManifestResourceStore::new(manifests));
    let steps: Vec<Box<dyn Step>> = DiscoveryStep::from_config(config, &store, &publisher)
        .into_iter()
        .map(|step| Box::new(step) as Box<dyn Step>)
        .collect();

    let mut report = DiscoveryReport::default();
    for step in steps {
        match step.execute().await {
            Ok(()) => report.succeeded.push(step.name().to_string()),
            Err(e) => {
                error!(step = step.name(), error = %e, "Discovery step failed");
                report.failed.push((step.name().to_string(), e.to_string()));
            }
        }
    }
    report
}

async fn cmd_discover(manifests: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config.as_deref())?;
    info!(
        manifests = %manifests.display(),
        resources = config.resources.len(),
        "Starting discovery"
    );

    let publisher: Arc<dyn EventPublisher> =
        Arc::new(TracingPublisher::new(JsonLinesPublisher::stdout()));
    let report = run_discovery(&config, &manifests, publisher).await;

    info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "Discovery finished"
    );

    if !report.is_success() {
        bail!(
            "{} of {} discovery steps failed",
            report.failed.len(),
            report.failed.len() + report.succeeded.len()
        );
    }
    Ok(())
}

fn cmd_validate_config(file: &Path) -> Result<()> {
    let config = load_config(Some(file))?;
    for descriptor in &config.resources {
        info!(
            resource = descriptor.label(),
            gvr = %descriptor.gvr(),
            namespace = %descriptor.namespace,
            subject = %descriptor.publish_subject,
            "Configured resource"
        );
    }
    info!(resources = config.resources.len(), "Config is valid");
    Ok(())
}
