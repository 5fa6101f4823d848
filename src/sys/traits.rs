// src/sys/traits.rs

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==============================================================================
// 1. Version & Alias Records (Platform Data Model)
// ==============================================================================

/// Identifier of a published version as the platform reports it.
///
/// Function versions arrive as strings (`"1"`, `"42"`, `"$LATEST"`), layer
/// versions as integers; both are normalised into this wrapper. Ordering is
/// numeric and lives in `retention`, never on the raw string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(String);

impl VersionId {
    /// The mutable pointer to a function's current code. Never deletable.
    pub const LATEST: &'static str = "$LATEST";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_latest(&self) -> bool {
        self.0 == Self::LATEST
    }

    /// Numeric rank of the identifier, `None` when it is not an integer.
    pub fn number(&self) -> Option<u64> {
        if self.0.is_empty() || !self.0.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.0.parse().ok()
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for VersionId {
    fn from(number: u64) -> Self {
        Self(number.to_string())
    }
}

impl From<&str> for VersionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub version: VersionId,
    pub last_modified: Option<String>,
}

impl VersionRecord {
    #[cfg(test)]
    pub fn new(version: impl Into<VersionId>) -> Self {
        Self { version: version.into(), last_modified: None }
    }
}

/// A named pointer bound to exactly one function version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRecord {
    pub name: String,
    pub function_version: VersionId,
}

impl AliasRecord {
    pub fn new(name: impl Into<String>, function_version: impl Into<VersionId>) -> Self {
        Self { name: name.into(), function_version: function_version.into() }
    }
}

/// One page of a listing call. `next_marker` is the continuation token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_marker: Option<String>,
}

// ==============================================================================
// 2. Remote Failure Contract
// ==============================================================================

const REPLICATED_PREFIX: &str = "Lambda was unable to delete";
const REPLICATED_MARKER: &str = "because it is a replicated function";

/// A failure reported by the platform: HTTP-like status (when known), the
/// service error code and its message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} (status {}): {message}", code_label(.code), status_label(.status))]
pub struct PlatformError {
    pub status: Option<u16>,
    pub code: Option<String>,
    pub message: String,
}

fn code_label(code: &Option<String>) -> &str {
    code.as_deref().unwrap_or("RemoteError")
}

fn status_label(status: &Option<u16>) -> String {
    status.map(|s| s.to_string()).unwrap_or_else(|| "unknown".into())
}

impl PlatformError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self { status, code: None, message: message.into() }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// The resource does not exist (never deployed or removed out of band).
    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }

    /// Lambda@Edge replicas cannot be deleted by region; the platform removes
    /// them on its own once the distribution lets go.
    pub fn is_replicated_function_rejection(&self) -> bool {
        self.status == Some(400)
            && self.message.starts_with(REPLICATED_PREFIX)
            && self.message.contains(REPLICATED_MARKER)
    }
}

// ==============================================================================
// 3. Platform Abstraction (Lambda-shaped API)
// ==============================================================================

#[async_trait]
pub trait LambdaPlatform: Send + Sync {
    /// One page of the published versions of a function, `$LATEST` included.
    async fn list_versions(
        &self,
        function_name: &str,
        marker: Option<&str>,
    ) -> Result<Page<VersionRecord>, PlatformError>;

    async fn list_aliases(
        &self,
        function_name: &str,
        marker: Option<&str>,
    ) -> Result<Page<AliasRecord>, PlatformError>;

    async fn list_layer_versions(
        &self,
        layer_name: &str,
        marker: Option<&str>,
    ) -> Result<Page<VersionRecord>, PlatformError>;

    async fn delete_version(&self, function_name: &str, version: &VersionId) -> Result<(), PlatformError>;

    async fn delete_layer_version(&self, layer_name: &str, version: &VersionId) -> Result<(), PlatformError>;
}

// ==============================================================================
// 4. Log Capability (Severity-Named)
// ==============================================================================

/// Severity-named log sink. One adapter is picked at construction and shared
/// by every component of a run.
pub trait PruneLogger: Send + Sync {
    fn info(&self, message: &str);
    fn notice(&self, message: &str);
    fn warning(&self, message: &str);
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}
