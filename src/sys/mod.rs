// Platform-facing pieces. Traits are the seam; everything else plugs into them.

pub mod traits;     // Global contracts
pub mod aws_cli;    // aws CLI backed platform client
pub mod lister;     // De-paginated listings
pub mod cleanup;    // Version deletion
pub mod logger;     // Severity adapter over tracing

#[cfg(test)]
pub mod fake;       // In-memory platform for tests
