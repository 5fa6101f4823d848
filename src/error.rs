// src/error.rs

use std::path::PathBuf;

use crate::sys::traits::{PlatformError, VersionId};

/// Problems found while resolving what to prune. Raised before any platform
/// call is made.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read project config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse project config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Function \"{0}\" doesn't exist in this service")]
    UnknownFunction(String),
    #[error("Layer \"{0}\" doesn't exist in this service")]
    UnknownLayer(String),
    #[error("A retention count is required: pass --number or set custom.prune.number")]
    MissingNumber,
    #[error("No handler is registered for lifecycle event '{0}'")]
    UnknownEvent(String),
    #[error("Invalid resource name '{0}'")]
    InvalidName(String),
    #[error("Invalid environment value {key}={value}")]
    InvalidEnv { key: &'static str, value: String },
}

/// Why a single resource's sweep failed. Sibling resources are unaffected.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PruneError {
    #[error("Listing {what} for {resource} failed: {source}")]
    Listing {
        resource: String,
        what: &'static str,
        #[source]
        source: PlatformError,
    },
    #[error("Deleting {resource}:{version} failed: {source}")]
    Deletion {
        resource: String,
        version: VersionId,
        #[source]
        source: PlatformError,
    },
}

impl PruneError {
    pub fn resource(&self) -> &str {
        match self {
            Self::Listing { resource, .. } | Self::Deletion { resource, .. } => resource,
        }
    }
}
