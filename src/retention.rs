// src/retention.rs
//
// Version-retention decisions. Everything here is pure: no platform calls,
// no logging, identical inputs give identical output.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::sys::traits::{AliasRecord, VersionId, VersionRecord};

/// How many of the most recent eligible versions survive a sweep.
/// Aliased versions and `$LATEST` are kept on top of this count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub keep: u32,
}

impl RetentionPolicy {
    pub fn keep(keep: u32) -> Self {
        Self { keep }
    }

    pub fn select_function_versions(&self, versions: &[VersionRecord], aliases: &[AliasRecord]) -> Vec<VersionId> {
        select_function_versions(versions, aliases, self.keep as usize)
    }

    pub fn select_layer_versions(&self, versions: &[VersionRecord]) -> Vec<VersionId> {
        select_layer_versions(versions, self.keep as usize)
    }
}

/// Newest first. Equal ranks compare equal so the stable sort keeps input order.
fn newest_first(a: &(u64, VersionId), b: &(u64, VersionId)) -> Ordering {
    b.0.cmp(&a.0)
}

fn rank_and_trim<'a>(ids: impl Iterator<Item = &'a VersionId>, keep: usize) -> Vec<VersionId> {
    // Identifiers without a numeric rank cannot be ordered against the
    // issuance counter, so they never become candidates.
    let mut ranked: Vec<(u64, VersionId)> = ids
        .filter_map(|id| id.number().map(|n| (n, id.clone())))
        .collect();

    ranked.sort_by(newest_first);

    ranked.into_iter().skip(keep).map(|(_, id)| id).collect()
}

/// Function versions safe to delete: everything except `$LATEST`, aliased
/// versions and the `keep` most recent of the rest, newest first.
pub fn select_function_versions(versions: &[VersionRecord], aliases: &[AliasRecord], keep: usize) -> Vec<VersionId> {
    let aliased: HashSet<&VersionId> = aliases.iter().map(|a| &a.function_version).collect();

    let eligible = versions
        .iter()
        .map(|v| &v.version)
        .filter(|id| !id.is_latest())
        .filter(|id| !aliased.contains(id));

    rank_and_trim(eligible, keep)
}

/// Layer versions safe to delete. Layers have no `$LATEST` and no aliases.
pub fn select_layer_versions(versions: &[VersionRecord], keep: usize) -> Vec<VersionId> {
    rank_and_trim(versions.iter().map(|v| &v.version), keep)
}
