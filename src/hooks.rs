// src/hooks.rs
//
// Entry points into the coordinator. The host lifecycle names events; this
// table maps each one to the function that turns a request into a plan.

use std::sync::Arc;

use crate::config::{ProjectConfig, resolve_keep};
use crate::coordinator::{PruneCoordinator, SweepOptions, SweepReport};
use crate::error::{ConfigError, PruneError};
use crate::retention::RetentionPolicy;
use crate::sys::traits::PruneLogger;

pub const PRUNE_EVENT: &str = "prune:prune";
pub const POST_DEPLOY_EVENT: &str = "after:deploy:deploy";

/// What the operator (or the deploy pipeline) asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneRequest {
    pub number: Option<u32>,
    pub function: Option<String>,
    pub layer: Option<String>,
    pub include_layers: bool,
    pub dry_run: bool,
    /// The deploy step was skipped, so there is nothing new to prune after.
    pub no_deploy: bool,
}

/// Fully resolved work: retention, mode and the platform names per sweep.
/// `None` means that sweep does not run at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrunePlan {
    pub options: SweepOptions,
    pub functions: Option<Vec<String>>,
    pub layers: Option<Vec<String>>,
}

pub type HookHandler = fn(&ProjectConfig, &str, &PruneRequest) -> Result<Option<PrunePlan>, ConfigError>;

pub const LIFECYCLE_HOOKS: &[(&str, HookHandler)] = &[(PRUNE_EVENT, cli_prune), (POST_DEPLOY_EVENT, post_deploy)];

pub fn handler_for(event: &str) -> Option<HookHandler> {
    LIFECYCLE_HOOKS.iter().find(|(name, _)| *name == event).map(|(_, handler)| *handler)
}

// ==============================================================================
// 1. Interactive Trigger (`prune`)
// ==============================================================================

fn cli_prune(project: &ProjectConfig, stage: &str, request: &PruneRequest) -> Result<Option<PrunePlan>, ConfigError> {
    plan_cli_prune(project, stage, request).map(Some)
}

/// `--include-layers` runs both sweeps; `--layer` alone runs only layers;
/// anything else runs only functions.
pub fn plan_cli_prune(project: &ProjectConfig, stage: &str, request: &PruneRequest) -> Result<PrunePlan, ConfigError> {
    let keep = request.number.ok_or(ConfigError::MissingNumber)?;
    let options = SweepOptions { policy: RetentionPolicy::keep(keep), dry_run: request.dry_run };

    let (sweep_functions, sweep_layers) = if request.include_layers {
        (true, true)
    } else if request.layer.is_some() && request.function.is_none() {
        (false, true)
    } else {
        (true, false)
    };

    Ok(PrunePlan {
        options,
        functions: sweep_functions
            .then(|| project.function_names(stage, request.function.as_deref()))
            .transpose()?,
        layers: sweep_layers.then(|| project.layer_names(request.layer.as_deref())).transpose()?,
    })
}

// ==============================================================================
// 2. Automatic Trigger (`after:deploy:deploy`)
// ==============================================================================

/// Fires only when `custom.prune.automatic` is true and a non-negative keep
/// count is known. An explicit `--number` beats the configured one.
fn post_deploy(project: &ProjectConfig, stage: &str, request: &PruneRequest) -> Result<Option<PrunePlan>, ConfigError> {
    if request.no_deploy {
        return Ok(None);
    }

    let settings = project.prune_settings();
    if !settings.automatic() {
        return Ok(None);
    }
    let Some(keep) = resolve_keep(request.number, settings.number()) else {
        return Ok(None);
    };

    let options = SweepOptions { policy: RetentionPolicy::keep(keep), dry_run: request.dry_run };
    let layers = if settings.include_layers() {
        Some(project.layer_names(request.layer.as_deref())?)
    } else {
        None
    };

    Ok(Some(PrunePlan {
        options,
        functions: Some(project.function_names(stage, request.function.as_deref())?),
        layers,
    }))
}

// ==============================================================================
// 3. Execution
// ==============================================================================

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub sweeps: Vec<SweepReport>,
}

impl RunSummary {
    pub fn failures(&self) -> impl Iterator<Item = &PruneError> {
        self.sweeps.iter().flat_map(|s| s.failures())
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Runs the planned sweeps. Function and layer sweeps touch different
/// resources, so they run side by side; both always finish before this returns.
pub async fn execute(coordinator: &PruneCoordinator, logger: &Arc<dyn PruneLogger>, plan: PrunePlan) -> RunSummary {
    if plan.options.dry_run {
        logger.notice("Dry-run enabled, no pruning actions will be performed.");
    }

    let options = plan.options;
    let functions = async {
        match &plan.functions {
            Some(names) => Some(coordinator.prune_functions(names, options).await),
            None => None,
        }
    };
    let layers = async {
        match &plan.layers {
            Some(names) => Some(coordinator.prune_layers(names, options).await),
            None => None,
        }
    };

    let (functions, layers) = tokio::join!(functions, layers);
    RunSummary { sweeps: functions.into_iter().chain(layers).collect() }
}
