// src/sys/lister.rs

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::sys::traits::{AliasRecord, LambdaPlatform, Page, PlatformError, VersionRecord};

/// Follows continuation markers until the listing is exhausted. The caller
/// only ever sees the concatenation of every page.
async fn drain_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>, PlatformError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, PlatformError>>,
{
    let mut items = Vec::new();
    let mut marker: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = fetch(marker.take()).await?;
        pages += 1;
        items.extend(page.items);

        match page.next_marker {
            Some(next) if !next.is_empty() => marker = Some(next),
            _ => break,
        }
    }

    debug!(pages, items = items.len(), "listing drained");
    Ok(items)
}

/// A resource that was never deployed, or was removed out of band, lists as
/// empty rather than failing the sweep.
fn not_found_as_empty<T>(result: Result<Vec<T>, PlatformError>) -> Result<Vec<T>, PlatformError> {
    match result {
        Err(e) if e.is_not_found() => Ok(Vec::new()),
        other => other,
    }
}

pub struct ResourceLister {
    platform: Arc<dyn LambdaPlatform>,
}

impl ResourceLister {
    pub fn new(platform: Arc<dyn LambdaPlatform>) -> Self {
        Self { platform }
    }

    pub async fn list_versions(&self, function_name: &str) -> Result<Vec<VersionRecord>, PlatformError> {
        let platform = &self.platform;
        not_found_as_empty(
            drain_pages(|marker| async move { platform.list_versions(function_name, marker.as_deref()).await }).await,
        )
    }

    pub async fn list_aliases(&self, function_name: &str) -> Result<Vec<AliasRecord>, PlatformError> {
        let platform = &self.platform;
        not_found_as_empty(
            drain_pages(|marker| async move { platform.list_aliases(function_name, marker.as_deref()).await }).await,
        )
    }

    pub async fn list_layer_versions(&self, layer_name: &str) -> Result<Vec<VersionRecord>, PlatformError> {
        let platform = &self.platform;
        not_found_as_empty(
            drain_pages(|marker| async move { platform.list_layer_versions(layer_name, marker.as_deref()).await })
                .await,
        )
    }
}
