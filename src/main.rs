// src/main.rs

use clap::Parser;
use std::sync::Arc;

mod cli;
mod config;
mod coordinator;
mod error;
mod hooks;
mod retention;
mod sys;

use crate::cli::{Cli, LogFormat};
use crate::config::{PrunerConfig, ProjectConfig};
use crate::coordinator::{PruneCoordinator, ResourceKind, ResourceOutcome, ResourceReport};
use crate::error::{ConfigError, PruneError};
use crate::sys::aws_cli::AwsCliPlatform;
use crate::sys::logger::TracingLogger;
use crate::sys::traits::{LambdaPlatform, PruneLogger};

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn report_resource(kind: ResourceKind, resource: &ResourceReport) {
    match &resource.outcome {
        ResourceOutcome::NotDeployed => {
            tracing::debug!(kind = %kind, resource = %resource.name, outcome = "not_deployed", "resource swept");
        }
        ResourceOutcome::DryRun { candidates } => {
            tracing::info!(
                kind = %kind,
                resource = %resource.name,
                outcome = "dry_run",
                candidates = candidates.len(),
                "resource swept"
            );
        }
        ResourceOutcome::Pruned(tally) => {
            tracing::info!(
                kind = %kind,
                resource = %resource.name,
                outcome = "pruned",
                deleted = tally.deleted,
                skipped_replicas = tally.skipped.len(),
                "resource swept"
            );
        }
        ResourceOutcome::Failed { tally, error } => {
            tracing::warn!(
                kind = %kind,
                resource = %resource.name,
                outcome = "failed",
                deleted = tally.deleted,
                skipped_replicas = tally.skipped.len(),
                error = %error,
                "resource swept"
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ==============================================================================
    // 1. Configuration & Environment
    // ==============================================================================

    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = cli.apply_to(PrunerConfig::load()?);
    let project = ProjectConfig::load(&config.project_file).await?;
    let deployment = project.deployment(cli.stage.as_deref(), cli.region.as_deref());

    // ==============================================================================
    // 2. Plan Resolution (no platform calls before this succeeds)
    // ==============================================================================

    let (event, request) = cli.request();
    let handler = hooks::handler_for(&event).ok_or_else(|| ConfigError::UnknownEvent(event.clone()))?;

    let Some(plan) = handler(&project, &deployment.stage, &request)? else {
        tracing::info!(event = %event, "automatic pruning is not enabled, nothing to do");
        return Ok(());
    };

    // ==============================================================================
    // 3. Dependency Injection & Sweep
    // ==============================================================================

    let platform: Arc<dyn LambdaPlatform> =
        Arc::new(AwsCliPlatform::new(config.aws_binary.clone(), deployment.region.clone(), config.profile.clone()));
    let logger: Arc<dyn PruneLogger> = Arc::new(TracingLogger);
    let coordinator = PruneCoordinator::new(platform, logger.clone(), config.verbose);

    tracing::debug!(
        service = %project.service,
        stage = %deployment.stage,
        region = %deployment.region,
        keep = plan.options.policy.keep,
        "starting prune"
    );

    let summary = hooks::execute(&coordinator, &logger, plan).await;

    // ==============================================================================
    // 4. Reporting
    // ==============================================================================

    for sweep in &summary.sweeps {
        for resource in &sweep.resources {
            report_resource(sweep.kind, resource);
        }
        tracing::info!(
            kind = %sweep.kind,
            resources = sweep.resources.len(),
            deleted = sweep.deleted(),
            started_at = %sweep.started_at.to_rfc3339(),
            elapsed_ms = sweep.elapsed.num_milliseconds(),
            "sweep finished"
        );
    }

    if !summary.is_success() {
        let failed: Vec<&str> = summary.failures().map(PruneError::resource).collect();
        return Err(format!("Pruning failed for {} resource(s): {}", failed.len(), failed.join(", ")).into());
    }

    Ok(())
}
