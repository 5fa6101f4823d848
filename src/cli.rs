// src/cli.rs

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::PrunerConfig;
use crate::hooks::{PRUNE_EVENT, PruneRequest};

/// Deletes stale published versions of deployed functions and layers.
#[derive(Debug, Parser)]
#[command(name = "version-pruner")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project file describing the service (JSON).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Stage of the service.
    #[arg(long, short = 's', global = true)]
    pub stage: Option<String>,

    /// Region of the service.
    #[arg(long, short = 'r', global = true)]
    pub region: Option<String>,

    /// AWS named profile passed through to the aws CLI.
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Log per-resource version, alias and candidate counts.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Clean up deployed functions and/or layers by deleting older versions.
    Prune(PruneArgs),
    /// Run the handler bound to a host lifecycle event (e.g. after:deploy:deploy).
    Hook(HookArgs),
}

#[derive(Debug, Args)]
pub struct PruneArgs {
    /// Number of previous versions to keep.
    #[arg(long, short = 'n')]
    pub number: u32,

    /// Function name. Limits cleanup to the specified function.
    #[arg(long, short = 'f')]
    pub function: Option<String>,

    /// Layer name. Limits cleanup to the specified layer.
    #[arg(long, short = 'l')]
    pub layer: Option<String>,

    /// Includes the pruning of layers.
    #[arg(long, short = 'i')]
    pub include_layers: bool,

    /// Report what would be pruned without deleting anything.
    #[arg(long, short = 'd')]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct HookArgs {
    /// Lifecycle event name.
    pub event: String,

    /// Overrides custom.prune.number.
    #[arg(long, short = 'n')]
    pub number: Option<u32>,

    /// Function name. Limits cleanup to the specified function.
    #[arg(long, short = 'f')]
    pub function: Option<String>,

    /// Layer name. Limits layer cleanup to the specified layer.
    #[arg(long, short = 'l')]
    pub layer: Option<String>,

    /// The deployment step was skipped.
    #[arg(long)]
    pub no_deploy: bool,

    /// Report only.
    #[arg(long, short = 'd')]
    pub dry_run: bool,
}

impl Cli {
    /// Layers CLI flags over the environment-derived config.
    pub fn apply_to(&self, mut config: PrunerConfig) -> PrunerConfig {
        if let Some(path) = &self.config {
            config.project_file = path.clone();
        }
        if let Some(profile) = &self.profile {
            config.profile = Some(profile.clone());
        }
        config.verbose |= self.verbose;
        config
    }

    /// Lifecycle event and request for the chosen subcommand.
    pub fn request(&self) -> (String, PruneRequest) {
        match &self.command {
            Commands::Prune(args) => (
                PRUNE_EVENT.to_string(),
                PruneRequest {
                    number: Some(args.number),
                    function: args.function.clone(),
                    layer: args.layer.clone(),
                    include_layers: args.include_layers,
                    dry_run: args.dry_run,
                    no_deploy: false,
                },
            ),
            Commands::Hook(args) => (
                args.event.clone(),
                PruneRequest {
                    number: args.number,
                    function: args.function.clone(),
                    layer: args.layer.clone(),
                    include_layers: false,
                    dry_run: args.dry_run,
                    no_deploy: args.no_deploy,
                },
            ),
        }
    }
}
