// src/config.rs

use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::error::ConfigError;

const DEFAULT_STAGE: &str = "dev";
const DEFAULT_REGION: &str = "us-east-1";

// Function names, layer names and their ARNs.
static RESOURCE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_:.\-]+$").expect("resource name pattern is a valid regex"));

/// 🛡️ Names end up as `aws` CLI arguments: reject anything that could be read
/// as a flag or smuggle characters the platform would never accept.
pub fn validate_resource_name(name: &str) -> Result<(), ConfigError> {
    if name.starts_with('-') || !RESOURCE_NAME.is_match(name) {
        return Err(ConfigError::InvalidName(name.to_string()));
    }
    Ok(())
}

// ==============================================================================
// 1. Process Environment
// ==============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrunerConfig {
    pub project_file: PathBuf,
    pub aws_binary: String,
    pub profile: Option<String>,
    pub verbose: bool,
}

impl PrunerConfig {
    /// Reads the environment once; CLI flags are layered on top by `main`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let verbose = match lookup("PRUNE_DEBUG").as_deref() {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") | Some("*") => true,
            Some(other) => {
                return Err(ConfigError::InvalidEnv { key: "PRUNE_DEBUG", value: other.to_string() });
            }
        };

        Ok(Self {
            project_file: lookup("PRUNE_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("serverless.json")),
            aws_binary: lookup("PRUNE_AWS_BIN").unwrap_or_else(|| "aws".to_string()),
            profile: lookup("AWS_PROFILE").filter(|p| !p.is_empty()),
            verbose,
        })
    }
}

// ==============================================================================
// 2. Project File (serverless.json)
// ==============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ProviderSection {
    pub stage: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResourceDef {
    /// Platform-side name when it differs from the generated one.
    pub name: Option<String>,
}

/// `custom.prune`. A value of the wrong type counts as unset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneSettings {
    #[serde(default)]
    number: serde_json::Value,
    #[serde(default)]
    automatic: serde_json::Value,
    #[serde(default)]
    include_layers: serde_json::Value,
}

impl PruneSettings {
    /// The configured keep count. Integers and integer strings count; a
    /// negative value is returned as-is so callers can refuse it.
    pub fn number(&self) -> Option<i64> {
        match &self.number {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn automatic(&self) -> bool {
        self.automatic.as_bool().unwrap_or(false)
    }

    pub fn include_layers(&self) -> bool {
        self.include_layers.as_bool().unwrap_or(false)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomSection {
    #[serde(default)]
    pub prune: Option<PruneSettings>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectConfig {
    pub service: String,
    #[serde(default)]
    pub provider: ProviderSection,
    #[serde(default)]
    pub functions: BTreeMap<String, Option<ResourceDef>>,
    #[serde(default)]
    pub layers: BTreeMap<String, Option<ResourceDef>>,
    #[serde(default)]
    pub custom: CustomSection,
}

/// Where the service is deployed, after CLI overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub stage: String,
    pub region: String,
}

impl ProjectConfig {
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::parse(path, &raw)
    }

    pub fn parse(path: &Path, raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn prune_settings(&self) -> PruneSettings {
        self.custom.prune.clone().unwrap_or_default()
    }

    pub fn deployment(&self, stage: Option<&str>, region: Option<&str>) -> Deployment {
        Deployment {
            stage: stage
                .or(self.provider.stage.as_deref())
                .unwrap_or(DEFAULT_STAGE)
                .to_string(),
            region: region
                .or(self.provider.region.as_deref())
                .unwrap_or(DEFAULT_REGION)
                .to_string(),
        }
    }

    /// Platform names of the functions to sweep: the one named by `only`, or
    /// every configured function. Generated names follow
    /// `<service>-<stage>-<key>`.
    pub fn function_names(&self, stage: &str, only: Option<&str>) -> Result<Vec<String>, ConfigError> {
        let keys: Vec<&String> = match only {
            Some(key) => vec![
                self.functions
                    .get_key_value(key)
                    .map(|(k, _)| k)
                    .ok_or_else(|| ConfigError::UnknownFunction(key.to_string()))?,
            ],
            None => self.functions.keys().collect(),
        };

        keys.into_iter()
            .map(|key| {
                let explicit = self.functions.get(key).and_then(|def| def.as_ref()).and_then(|d| d.name.clone());
                let name = explicit.unwrap_or_else(|| format!("{}-{}-{}", self.service, stage, key));
                validate_resource_name(&name)?;
                Ok(name)
            })
            .collect()
    }

    /// Platform names of the layers to sweep. A layer without an explicit
    /// name is published under its key.
    pub fn layer_names(&self, only: Option<&str>) -> Result<Vec<String>, ConfigError> {
        let keys: Vec<&String> = match only {
            Some(key) => vec![
                self.layers
                    .get_key_value(key)
                    .map(|(k, _)| k)
                    .ok_or_else(|| ConfigError::UnknownLayer(key.to_string()))?,
            ],
            None => self.layers.keys().collect(),
        };

        keys.into_iter()
            .map(|key| {
                let explicit = self.layers.get(key).and_then(|def| def.as_ref()).and_then(|d| d.name.clone());
                let name = explicit.unwrap_or_else(|| key.clone());
                validate_resource_name(&name)?;
                Ok(name)
            })
            .collect()
    }
}

/// Keep count for the post-deploy trigger. An explicit override always wins;
/// otherwise the configured count, provided it is non-negative.
pub fn resolve_keep(override_number: Option<u32>, configured: Option<i64>) -> Option<u32> {
    match override_number {
        Some(n) => Some(n),
        None => configured.and_then(|n| u32::try_from(n).ok()),
    }
}
