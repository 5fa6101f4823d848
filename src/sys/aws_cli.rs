// src/sys/aws_cli.rs
//
// LambdaPlatform backed by the `aws` CLI. Every call is a single
// non-paginated request; paging is driven by the lister through `--marker`.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::LazyLock;
use tokio::process::Command;
use tracing::debug;

use crate::sys::traits::{AliasRecord, LambdaPlatform, Page, PlatformError, VersionId, VersionRecord};

static CLI_ERROR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)An error occurred \(([A-Za-z0-9]+)\) when calling the [A-Za-z0-9]+ operation(?: \([^)]*\))?: (.*)")
        .expect("CLI error pattern is a valid regex")
});

/// HTTP status the Lambda API pairs with each service error code.
fn status_for_code(code: &str) -> Option<u16> {
    match code {
        "InvalidParameterValueException" | "InvalidRequestContentException" => Some(400),
        "AccessDeniedException" | "AccessDeniedFault" => Some(403),
        "ResourceNotFoundException" => Some(404),
        "ResourceConflictException" | "ResourceInUseException" => Some(409),
        "PreconditionFailedException" => Some(412),
        "TooManyRequestsException" | "ThrottlingException" => Some(429),
        "ServiceException" => Some(500),
        _ => None,
    }
}

/// Turns the CLI's stderr into a structured error. Output that does not look
/// like a service error (missing credentials, bad install) keeps its text
/// and carries no status.
pub fn parse_cli_error(stderr: &str) -> PlatformError {
    match CLI_ERROR.captures(stderr) {
        Some(caps) => {
            let code = &caps[1];
            PlatformError::new(status_for_code(code), caps[2].trim()).with_code(code)
        }
        None => PlatformError::new(None, stderr.trim()),
    }
}

// ==============================================================================
// 1. Wire Shapes (`--output json`)
// ==============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListVersionsOutput {
    #[serde(default)]
    versions: Vec<WireFunctionVersion>,
    next_marker: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireFunctionVersion {
    version: String,
    last_modified: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListAliasesOutput {
    #[serde(default)]
    aliases: Vec<WireAlias>,
    next_marker: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireAlias {
    name: String,
    function_version: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListLayerVersionsOutput {
    #[serde(default)]
    layer_versions: Vec<WireLayerVersion>,
    next_marker: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireLayerVersion {
    version: u64,
    created_date: Option<String>,
}

fn decode<T: DeserializeOwned>(operation: &str, stdout: &[u8]) -> Result<T, PlatformError> {
    serde_json::from_slice(stdout)
        .map_err(|e| PlatformError::new(None, format!("Unreadable {} response: {}", operation, e)))
}

pub fn parse_versions_page(stdout: &[u8]) -> Result<Page<VersionRecord>, PlatformError> {
    let out: ListVersionsOutput = decode("list-versions-by-function", stdout)?;
    Ok(Page {
        items: out
            .versions
            .into_iter()
            .map(|v| VersionRecord { version: VersionId::new(v.version), last_modified: v.last_modified })
            .collect(),
        next_marker: out.next_marker,
    })
}

pub fn parse_aliases_page(stdout: &[u8]) -> Result<Page<AliasRecord>, PlatformError> {
    let out: ListAliasesOutput = decode("list-aliases", stdout)?;
    Ok(Page {
        items: out.aliases.into_iter().map(|a| AliasRecord::new(a.name, a.function_version.as_str())).collect(),
        next_marker: out.next_marker,
    })
}

pub fn parse_layer_versions_page(stdout: &[u8]) -> Result<Page<VersionRecord>, PlatformError> {
    let out: ListLayerVersionsOutput = decode("list-layer-versions", stdout)?;
    Ok(Page {
        items: out
            .layer_versions
            .into_iter()
            .map(|v| VersionRecord { version: VersionId::from(v.version), last_modified: v.created_date })
            .collect(),
        next_marker: out.next_marker,
    })
}

// ==============================================================================
// 2. Concrete Implementation (aws CLI)
// ==============================================================================

pub struct AwsCliPlatform {
    binary: String, // Injected via PrunerConfig, e.g. "aws"
    region: String,
    profile: Option<String>,
}

impl AwsCliPlatform {
    pub fn new(binary: String, region: String, profile: Option<String>) -> Self {
        Self { binary, region, profile }
    }

    /// Full argument vector for one `aws lambda` call.
    fn arguments(&self, operation: &str, params: &[(&str, &str)]) -> Vec<String> {
        let mut args = vec![
            "lambda".to_string(),
            operation.to_string(),
            "--region".to_string(),
            self.region.clone(),
            "--output".to_string(),
            "json".to_string(),
        ];
        if let Some(profile) = &self.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        for (flag, value) in params {
            args.push(flag.to_string());
            args.push(value.to_string());
        }
        args
    }

    fn listing_arguments(&self, operation: &str, name_flag: &str, name: &str, marker: Option<&str>) -> Vec<String> {
        let mut params = vec![(name_flag, name)];
        if let Some(marker) = marker {
            params.push(("--marker", marker));
        }
        let mut args = self.arguments(operation, &params);
        args.push("--no-paginate".to_string());
        args
    }

    async fn run(&self, args: Vec<String>) -> Result<Vec<u8>, PlatformError> {
        debug!(binary = %self.binary, ?args, "aws call");

        let output = Command::new(&self.binary)
            .args(&args)
            .env("AWS_PAGER", "")
            .output()
            .await
            .map_err(|e| PlatformError::new(None, format!("Failed to spawn {}: {}", self.binary, e)))?;

        if !output.status.success() {
            return Err(parse_cli_error(&String::from_utf8_lossy(&output.stderr)));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl LambdaPlatform for AwsCliPlatform {
    async fn list_versions(&self, function_name: &str, marker: Option<&str>) -> Result<Page<VersionRecord>, PlatformError> {
        let args = self.listing_arguments("list-versions-by-function", "--function-name", function_name, marker);
        parse_versions_page(&self.run(args).await?)
    }

    async fn list_aliases(&self, function_name: &str, marker: Option<&str>) -> Result<Page<AliasRecord>, PlatformError> {
        let args = self.listing_arguments("list-aliases", "--function-name", function_name, marker);
        parse_aliases_page(&self.run(args).await?)
    }

    async fn list_layer_versions(&self, layer_name: &str, marker: Option<&str>) -> Result<Page<VersionRecord>, PlatformError> {
        let args = self.listing_arguments("list-layer-versions", "--layer-name", layer_name, marker);
        parse_layer_versions_page(&self.run(args).await?)
    }

    async fn delete_version(&self, function_name: &str, version: &VersionId) -> Result<(), PlatformError> {
        let args = self.arguments(
            "delete-function",
            &[("--function-name", function_name), ("--qualifier", version.as_str())],
        );
        self.run(args).await.map(|_| ())
    }

    async fn delete_layer_version(&self, layer_name: &str, version: &VersionId) -> Result<(), PlatformError> {
        let args = self.arguments(
            "delete-layer-version",
            &[("--layer-name", layer_name), ("--version-number", version.as_str())],
        );
        self.run(args).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_not_found_with_status() {
        let err = parse_cli_error(
            "\nAn error occurred (ResourceNotFoundException) when calling the ListVersionsByFunction operation: \
             Function not found: arn:aws:lambda:us-east-1:123456789012:function:svc-dev-api\n",
        );
        assert_eq!(err.status, Some(404));
        assert_eq!(err.code.as_deref(), Some("ResourceNotFoundException"));
        assert!(err.message.starts_with("Function not found"));
        assert!(err.is_not_found());
    }

    #[test]
    fn parses_replicated_rejection() {
        let err = parse_cli_error(
            "An error occurred (InvalidParameterValueException) when calling the DeleteFunction operation: \
             Lambda was unable to delete arn:aws:lambda:us-east-1:123456789012:function:edge:4 because it is a replicated function. \
             Please see our documentation for Deleting Lambda@Edge Functions and Replicas.",
        );
        assert_eq!(err.status, Some(400));
        assert!(err.is_replicated_function_rejection());
    }

    #[test]
    fn parses_retry_suffix() {
        let err = parse_cli_error(
            "An error occurred (TooManyRequestsException) when calling the DeleteFunction operation (reached max retries: 2): Rate exceeded",
        );
        assert_eq!(err.status, Some(429));
        assert_eq!(err.message, "Rate exceeded");
    }

    #[test]
    fn unstructured_stderr_has_no_status() {
        let err = parse_cli_error("Unable to locate credentials. You can configure credentials by running \"aws configure\".\n");
        assert_eq!(err.status, None);
        assert_eq!(err.code, None);
        assert!(err.message.starts_with("Unable to locate credentials"));
    }

    #[test]
    fn decodes_function_versions_page() {
        let page = parse_versions_page(
            br#"{"Versions":[{"FunctionName":"api","Version":"$LATEST","LastModified":"2024-03-01T10:00:00.000+0000"},
                {"FunctionName":"api","Version":"12"}],"NextMarker":"abc"}"#,
        )
        .unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.items[0].version.is_latest());
        assert_eq!(page.items[0].last_modified.as_deref(), Some("2024-03-01T10:00:00.000+0000"));
        assert_eq!(page.items[1].version.as_str(), "12");
        assert_eq!(page.next_marker.as_deref(), Some("abc"));
    }

    #[test]
    fn decodes_aliases_and_layer_versions() {
        let aliases = parse_aliases_page(br#"{"Aliases":[{"Name":"live","FunctionVersion":"7","AliasArn":"x"}]}"#).unwrap();
        assert_eq!(aliases.items, vec![AliasRecord::new("live", "7")]);
        assert_eq!(aliases.next_marker, None);

        let layers = parse_layer_versions_page(br#"{"LayerVersions":[{"Version":3,"CreatedDate":"2024-01-01"},{"Version":10}]}"#)
            .unwrap();
        let ids: Vec<&str> = layers.items.iter().map(|v| v.version.as_str()).collect();
        assert_eq!(ids, vec!["3", "10"]);
    }

    #[test]
    fn missing_list_field_reads_as_empty_page() {
        assert!(parse_versions_page(b"{}").unwrap().items.is_empty());
    }

    #[test]
    fn garbage_output_is_an_error() {
        let err = parse_layer_versions_page(b"not json").unwrap_err();
        assert!(err.message.starts_with("Unreadable list-layer-versions response"));
    }

    #[test]
    fn listing_arguments_carry_marker_and_profile() {
        let cli = AwsCliPlatform::new("aws".into(), "eu-west-1".into(), Some("ops".into()));
        let args = cli.listing_arguments("list-aliases", "--function-name", "svc-dev-api", Some("m1"));
        assert_eq!(
            args,
            vec![
                "lambda", "list-aliases", "--region", "eu-west-1", "--output", "json", "--profile", "ops",
                "--function-name", "svc-dev-api", "--marker", "m1", "--no-paginate",
            ]
        );
    }

    #[test]
    fn delete_arguments_use_qualifier() {
        let cli = AwsCliPlatform::new("aws".into(), "us-east-1".into(), None);
        let args = cli.arguments("delete-function", &[("--function-name", "api"), ("--qualifier", "4")]);
        assert_eq!(
            args,
            vec!["lambda", "delete-function", "--region", "us-east-1", "--output", "json", "--function-name", "api", "--qualifier", "4"]
        );
    }

    #[tokio::test]
    async fn spawn_failure_is_a_platform_error() {
        let cli = AwsCliPlatform::new("/nonexistent/aws-binary".into(), "us-east-1".into(), None);
        let err = cli.list_versions("api", None).await.unwrap_err();
        assert_eq!(err.status, None);
        assert!(err.message.starts_with("Failed to spawn /nonexistent/aws-binary"));
    }
}
