// src/sys/cleanup.rs

use std::sync::Arc;

use crate::error::PruneError;
use crate::sys::traits::{LambdaPlatform, PruneLogger, VersionId};

/// What a deletion pass did for one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionTally {
    pub deleted: usize,
    /// Edge replicas the platform refused to delete by region.
    pub skipped: Vec<VersionId>,
}

/// A pass that stopped early. `tally` counts what was removed before `error`.
#[derive(Debug, Clone)]
pub struct DeletionFailure {
    pub tally: DeletionTally,
    pub error: PruneError,
}

pub struct DeletionExecutor {
    platform: Arc<dyn LambdaPlatform>,
    logger: Arc<dyn PruneLogger>,
}

impl DeletionExecutor {
    pub fn new(platform: Arc<dyn LambdaPlatform>, logger: Arc<dyn PruneLogger>) -> Self {
        Self { platform, logger }
    }

    /// Deletes one version at a time. A replicated Lambda@Edge version is
    /// skipped with a warning; any other failure stops this function's pass.
    pub async fn delete_function_versions(
        &self,
        function_name: &str,
        versions: &[VersionId],
    ) -> Result<DeletionTally, DeletionFailure> {
        let mut tally = DeletionTally::default();

        for version in versions {
            self.logger.info(&format!("Deleting function {} v{}...", function_name, version));

            match self.platform.delete_version(function_name, version).await {
                Ok(()) => tally.deleted += 1,
                Err(e) if e.is_replicated_function_rejection() => {
                    self.logger.warning(&format!(
                        "Unable to delete replicated Lambda@Edge function version {}:{}.",
                        function_name, version
                    ));
                    tally.skipped.push(version.clone());
                }
                Err(source) => {
                    let error = PruneError::Deletion {
                        resource: function_name.to_string(),
                        version: version.clone(),
                        source,
                    };
                    return Err(DeletionFailure { tally, error });
                }
            }
        }

        Ok(tally)
    }

    /// Layer versions have no tolerated failure: the first error ends the pass.
    pub async fn delete_layer_versions(
        &self,
        layer_name: &str,
        versions: &[VersionId],
    ) -> Result<DeletionTally, DeletionFailure> {
        let mut tally = DeletionTally::default();

        for version in versions {
            self.logger.info(&format!("Deleting layer version {}:{}.", layer_name, version));

            if let Err(source) = self.platform.delete_layer_version(layer_name, version).await {
                let error = PruneError::Deletion {
                    resource: layer_name.to_string(),
                    version: version.clone(),
                    source,
                };
                return Err(DeletionFailure { tally, error });
            }
            tally.deleted += 1;
        }

        Ok(tally)
    }
}
