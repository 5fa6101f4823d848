// src/sys/fake.rs
//
// In-memory platform and log recorder for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::sys::traits::{
    AliasRecord, LambdaPlatform, Page, PlatformError, PruneLogger, VersionId, VersionRecord,
};

#[derive(Default)]
struct FakeState {
    page_size: usize,
    functions: HashMap<String, (Vec<VersionRecord>, Vec<AliasRecord>)>,
    layers: HashMap<String, Vec<VersionRecord>>,
    listing_failures: HashMap<String, PlatformError>,
    delete_failures: HashMap<(String, String), PlatformError>,
    list_calls: HashMap<String, usize>,
    delete_calls: Vec<(String, String)>,
}

/// Serves pages of `page_size` items and removes versions on delete, so a
/// second sweep observes the first one's effect.
#[derive(Clone)]
pub struct FakePlatform {
    state: Arc<Mutex<FakeState>>,
}

fn not_found(name: &str) -> PlatformError {
    PlatformError::new(Some(404), format!("Function not found: {}", name)).with_code("ResourceNotFoundException")
}

fn paginate<T: Clone>(items: &[T], marker: Option<&str>, page_size: usize) -> Page<T> {
    let start: usize = marker.and_then(|m| m.parse().ok()).unwrap_or(0);
    let end = (start + page_size).min(items.len());
    let next_marker = (end < items.len()).then(|| end.to_string());
    Page { items: items[start.min(end)..end].to_vec(), next_marker }
}

impl FakePlatform {
    pub fn new() -> Self {
        let state = FakeState { page_size: 50, ..FakeState::default() };
        Self { state: Arc::new(Mutex::new(state)) }
    }

    pub fn with_page_size(self, page_size: usize) -> Self {
        self.state.lock().unwrap().page_size = page_size.max(1);
        self
    }

    /// Registers a deployed function. `$LATEST` is prepended the way the
    /// platform reports it.
    pub fn with_function(self, name: &str, versions: &[&str], aliases: &[(&str, &str)]) -> Self {
        let mut records = vec![VersionRecord::new(VersionId::LATEST)];
        records.extend(versions.iter().map(|v| VersionRecord::new(*v)));
        let aliases = aliases.iter().map(|(alias, v)| AliasRecord::new(*alias, *v)).collect();
        self.state.lock().unwrap().functions.insert(name.to_string(), (records, aliases));
        self
    }

    pub fn with_layer(self, name: &str, versions: &[u64]) -> Self {
        let records = versions.iter().map(|v| VersionRecord::new(*v)).collect();
        self.state.lock().unwrap().layers.insert(name.to_string(), records);
        self
    }

    pub fn fail_listing(self, name: &str, error: PlatformError) -> Self {
        self.state.lock().unwrap().listing_failures.insert(name.to_string(), error);
        self
    }

    pub fn fail_delete(self, name: &str, version: &str, error: PlatformError) -> Self {
        self.state
            .lock()
            .unwrap()
            .delete_failures
            .insert((name.to_string(), version.to_string()), error);
        self
    }

    pub fn list_calls(&self, name: &str) -> usize {
        self.state.lock().unwrap().list_calls.get(name).copied().unwrap_or(0)
    }

    pub fn delete_calls(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().delete_calls.clone()
    }

    pub fn remaining_function_versions(&self, name: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .functions
            .get(name)
            .map(|(versions, _)| versions.iter().map(|v| v.version.to_string()).collect())
            .unwrap_or_default()
    }

    pub fn remaining_layer_versions(&self, name: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .layers
            .get(name)
            .map(|versions| versions.iter().map(|v| v.version.to_string()).collect())
            .unwrap_or_default()
    }

    fn delete(&self, name: &str, version: &VersionId, is_layer: bool) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.delete_calls.push((name.to_string(), version.to_string()));

        if let Some(err) = state.delete_failures.get(&(name.to_string(), version.to_string())) {
            return Err(err.clone());
        }

        let versions = if is_layer {
            state.layers.get_mut(name)
        } else {
            state.functions.get_mut(name).map(|(versions, _)| versions)
        };
        let versions = versions.ok_or_else(|| not_found(name))?;
        versions.retain(|v| &v.version != version);
        Ok(())
    }
}

#[async_trait]
impl LambdaPlatform for FakePlatform {
    async fn list_versions(&self, function_name: &str, marker: Option<&str>) -> Result<Page<VersionRecord>, PlatformError> {
        let mut state = self.state.lock().unwrap();
        *state.list_calls.entry(function_name.to_string()).or_default() += 1;
        if let Some(err) = state.listing_failures.get(function_name) {
            return Err(err.clone());
        }
        let (versions, _) = state.functions.get(function_name).ok_or_else(|| not_found(function_name))?;
        Ok(paginate(versions, marker, state.page_size))
    }

    async fn list_aliases(&self, function_name: &str, marker: Option<&str>) -> Result<Page<AliasRecord>, PlatformError> {
        let state = self.state.lock().unwrap();
        let (_, aliases) = state.functions.get(function_name).ok_or_else(|| not_found(function_name))?;
        Ok(paginate(aliases, marker, state.page_size))
    }

    async fn list_layer_versions(&self, layer_name: &str, marker: Option<&str>) -> Result<Page<VersionRecord>, PlatformError> {
        let mut state = self.state.lock().unwrap();
        *state.list_calls.entry(layer_name.to_string()).or_default() += 1;
        if let Some(err) = state.listing_failures.get(layer_name) {
            return Err(err.clone());
        }
        let versions = state.layers.get(layer_name).ok_or_else(|| not_found(layer_name))?;
        Ok(paginate(versions, marker, state.page_size))
    }

    async fn delete_version(&self, function_name: &str, version: &VersionId) -> Result<(), PlatformError> {
        self.delete(function_name, version, false)
    }

    async fn delete_layer_version(&self, layer_name: &str, version: &VersionId) -> Result<(), PlatformError> {
        self.delete(layer_name, version, true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Notice,
    Warning,
    Success,
    Error,
}

/// Captures every message with its severity.
#[derive(Default)]
pub struct RecordingLogger {
    entries: Mutex<Vec<(Severity, String)>>,
}

impl RecordingLogger {
    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.entries.lock().unwrap().clone()
    }

    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, m)| m)
            .collect()
    }

    fn push(&self, severity: Severity, message: &str) {
        self.entries.lock().unwrap().push((severity, message.to_string()));
    }
}

impl PruneLogger for RecordingLogger {
    fn info(&self, message: &str) {
        self.push(Severity::Info, message);
    }

    fn notice(&self, message: &str) {
        self.push(Severity::Notice, message);
    }

    fn warning(&self, message: &str) {
        self.push(Severity::Warning, message);
    }

    fn success(&self, message: &str) {
        self.push(Severity::Success, message);
    }

    fn error(&self, message: &str) {
        self.push(Severity::Error, message);
    }
}
