// src/sys/logger.rs

use tracing::{error, info, warn};

use crate::sys::traits::PruneLogger;

/// Routes severities onto tracing levels. Notice and success have no level of
/// their own, so they ride on INFO with a `severity` field that log shippers
/// can filter on.
pub struct TracingLogger;

impl PruneLogger for TracingLogger {
    fn info(&self, message: &str) {
        info!(target: "prune", severity = "info", "{}", message);
    }

    fn notice(&self, message: &str) {
        info!(target: "prune", severity = "notice", "{}", message);
    }

    fn warning(&self, message: &str) {
        warn!(target: "prune", severity = "warning", "{}", message);
    }

    fn success(&self, message: &str) {
        info!(target: "prune", severity = "success", "✔ {}", message);
    }

    fn error(&self, message: &str) {
        error!(target: "prune", severity = "error", "{}", message);
    }
}
