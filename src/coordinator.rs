// src/coordinator.rs

use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::{Instrument, info_span};

use crate::error::PruneError;
use crate::retention::RetentionPolicy;
use crate::sys::cleanup::{DeletionExecutor, DeletionFailure, DeletionTally};
use crate::sys::lister::ResourceLister;
use crate::sys::traits::{LambdaPlatform, PruneLogger, VersionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Function,
    Layer,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function => f.write_str("functions"),
            Self::Layer => f.write_str("layers"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepOptions {
    pub policy: RetentionPolicy,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub enum ResourceOutcome {
    /// Listing came back empty: never deployed or removed out of band.
    NotDeployed,
    DryRun { candidates: Vec<VersionId> },
    Pruned(DeletionTally),
    /// `tally` holds whatever was deleted before `error` stopped the pass.
    Failed { tally: DeletionTally, error: PruneError },
}

impl From<Result<DeletionTally, DeletionFailure>> for ResourceOutcome {
    fn from(result: Result<DeletionTally, DeletionFailure>) -> Self {
        match result {
            Ok(tally) => Self::Pruned(tally),
            Err(DeletionFailure { tally, error }) => Self::Failed { tally, error },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResourceReport {
    pub name: String,
    pub outcome: ResourceOutcome,
}

/// Result of one sweep over a set of functions or layers.
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub kind: ResourceKind,
    pub started_at: DateTime<Utc>,
    pub elapsed: TimeDelta,
    pub resources: Vec<ResourceReport>,
}

impl SweepReport {
    pub fn failures(&self) -> impl Iterator<Item = &PruneError> {
        self.resources.iter().filter_map(|r| match &r.outcome {
            ResourceOutcome::Failed { error, .. } => Some(error),
            _ => None,
        })
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn deleted(&self) -> usize {
        self.resources
            .iter()
            .map(|r| match &r.outcome {
                ResourceOutcome::Pruned(tally) | ResourceOutcome::Failed { tally, .. } => tally.deleted,
                _ => 0,
            })
            .sum()
    }
}

// ==============================================================================
// Run Coordinator
// ==============================================================================

/// Drives list → select → delete for one resource at a time. A resource
/// that fails is recorded and the sweep moves on to the next one.
pub struct PruneCoordinator {
    lister: ResourceLister,
    executor: DeletionExecutor,
    logger: Arc<dyn PruneLogger>,
    verbose: bool,
}

impl PruneCoordinator {
    pub fn new(platform: Arc<dyn LambdaPlatform>, logger: Arc<dyn PruneLogger>, verbose: bool) -> Self {
        Self {
            lister: ResourceLister::new(platform.clone()),
            executor: DeletionExecutor::new(platform, logger.clone()),
            logger,
            verbose,
        }
    }

    pub async fn prune_functions(&self, names: &[String], options: SweepOptions) -> SweepReport {
        self.sweep(ResourceKind::Function, names, options).await
    }

    pub async fn prune_layers(&self, names: &[String], options: SweepOptions) -> SweepReport {
        self.sweep(ResourceKind::Layer, names, options).await
    }

    async fn sweep(&self, kind: ResourceKind, names: &[String], options: SweepOptions) -> SweepReport {
        let started_at = Utc::now();
        let mut resources = Vec::with_capacity(names.len());

        for name in names {
            let span = info_span!("prune", kind = %kind, resource = %name);
            let result = match kind {
                ResourceKind::Function => self.prune_function(name, options).instrument(span).await,
                ResourceKind::Layer => self.prune_layer(name, options).instrument(span).await,
            };

            let outcome =
                result.unwrap_or_else(|error| ResourceOutcome::Failed { tally: DeletionTally::default(), error });
            if let ResourceOutcome::Failed { error, .. } = &outcome {
                self.logger.error(&error.to_string());
            }
            resources.push(ResourceReport { name: name.clone(), outcome });
        }

        let report = SweepReport { kind, started_at, elapsed: Utc::now() - started_at, resources };

        if report.is_success() {
            self.logger.success(&format!("Pruning of {} complete", kind));
        }
        report
    }

    async fn prune_function(&self, name: &str, options: SweepOptions) -> Result<ResourceOutcome, PruneError> {
        let versions = self.lister.list_versions(name).await.map_err(|source| PruneError::Listing {
            resource: name.to_string(),
            what: "versions",
            source,
        })?;
        if versions.is_empty() {
            return Ok(self.not_deployed(name));
        }

        let aliases = self.lister.list_aliases(name).await.map_err(|source| PruneError::Listing {
            resource: name.to_string(),
            what: "aliases",
            source,
        })?;

        let candidates = options.policy.select_function_versions(&versions, &aliases);

        if self.verbose {
            let published = versions.iter().filter(|v| !v.version.is_latest()).count();
            self.logger.info(&format!(
                "{} has {} additional version(s) published and {} alias(es), {} version(s) selected for deletion",
                name,
                published,
                aliases.len(),
                candidates.len()
            ));
        }
        if !candidates.is_empty() {
            self.logger.notice(&format!("Pruning function versions ({})", name));
        }

        if options.dry_run {
            return Ok(self.report_candidates(name, candidates));
        }
        Ok(self.executor.delete_function_versions(name, &candidates).await.into())
    }

    async fn prune_layer(&self, name: &str, options: SweepOptions) -> Result<ResourceOutcome, PruneError> {
        let versions = self.lister.list_layer_versions(name).await.map_err(|source| PruneError::Listing {
            resource: name.to_string(),
            what: "layer versions",
            source,
        })?;
        if versions.is_empty() {
            return Ok(self.not_deployed(name));
        }

        let candidates = options.policy.select_layer_versions(&versions);

        if self.verbose {
            self.logger.info(&format!(
                "{} has {} version(s) published, {} version(s) selected for deletion",
                name,
                versions.len(),
                candidates.len()
            ));
        }
        if !candidates.is_empty() {
            self.logger.notice(&format!("Pruning layer versions ({})", name));
        }

        if options.dry_run {
            return Ok(self.report_candidates(name, candidates));
        }
        Ok(self.executor.delete_layer_versions(name, &candidates).await.into())
    }

    fn not_deployed(&self, name: &str) -> ResourceOutcome {
        if self.verbose {
            self.logger.info(&format!("{} is not deployed, nothing to prune", name));
        }
        ResourceOutcome::NotDeployed
    }

    fn report_candidates(&self, name: &str, candidates: Vec<VersionId>) -> ResourceOutcome {
        for version in &candidates {
            self.logger.info(&format!("{}:{} selected for deletion.", name, version));
        }
        ResourceOutcome::DryRun { candidates }
    }
}
