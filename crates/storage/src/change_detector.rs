// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change Detector (§4.4): decides whether an external snapshot
//! (e.g. a re-imported export) diverges from the current store, and
//! if so, exactly which issues diverged and whether the divergence is
//! a genuine conflict.
//!
//! Two-tier check: a fast path compares whole-store content hashes
//! (§3.2 invariant 4) and short-circuits when nothing changed; a slow
//! path walks both issue sets to produce a per-issue diff only when
//! the fast path reports a difference.

use std::collections::HashMap;
use std::path::Path;
use std::time::SystemTime;

use bd_core::{Issue, IssueId};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Metadata the store remembers about the last successful import, used
/// by [`check_import`]'s fast path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportMetadata {
    pub last_import_hash: String,
    pub last_import_mtime: Option<SystemTime>,
}

impl ImportMetadata {
    /// Read back from the metadata key/value store (`last_import_hash`,
    /// `last_import_mtime` as milliseconds since the epoch).
    pub fn from_metadata(metadata: &HashMap<String, String>) -> Self {
        Self {
            last_import_hash: metadata.get("last_import_hash").cloned().unwrap_or_default(),
            last_import_mtime: metadata
                .get("last_import_mtime")
                .and_then(|s| s.parse::<u64>().ok())
                .map(|ms| SystemTime::UNIX_EPOCH + std::time::Duration::from_millis(ms)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStatus {
    Unchanged,
    Changed,
}

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot contains unresolved merge-conflict markers")]
    MergeConflict,
    #[error("pre-export guard: store is empty but snapshot file is not")]
    EmptyStoreNonEmptySnapshot,
    #[error("pre-export guard: snapshot file has changed since last import")]
    StaleImport,
}

/// Detect whether `path` has diverged from what was last imported
/// (§4.4). Unreadable files are reported as unchanged: the detector
/// must never auto-import something it cannot parse.
pub fn check_import(path: &Path, meta: &ImportMetadata) -> Result<(String, ImportStatus), DetectorError> {
    let Ok(file_meta) = std::fs::metadata(path) else { return Ok((meta.last_import_hash.clone(), ImportStatus::Unchanged)) };
    let Ok(bytes) = std::fs::read(path) else { return Ok((meta.last_import_hash.clone(), ImportStatus::Unchanged)) };

    if !meta.last_import_hash.is_empty() {
        if let (Ok(mtime), Some(last_mtime)) = (file_meta.modified(), meta.last_import_mtime) {
            if mtime == last_mtime {
                return Ok((meta.last_import_hash.clone(), ImportStatus::Unchanged));
            }
        }
    }

    if has_merge_conflict_markers(&bytes) {
        return Err(DetectorError::MergeConflict);
    }

    let hash = hex_sha256(&bytes);
    if !meta.last_import_hash.is_empty() && hash == meta.last_import_hash {
        return Ok((hash, ImportStatus::Unchanged));
    }
    Ok((hash, ImportStatus::Changed))
}

/// Refuse an export that would destroy remote edits (§4.4 pre-export guard).
pub fn validate_pre_export(store_is_empty: bool, snapshot_is_empty: bool, current_hash: &str, last_import_hash: &str) -> Result<(), DetectorError> {
    if store_is_empty && !snapshot_is_empty {
        return Err(DetectorError::EmptyStoreNonEmptySnapshot);
    }
    if !last_import_hash.is_empty() && current_hash != last_import_hash {
        return Err(DetectorError::StaleImport);
    }
    Ok(())
}

fn has_merge_conflict_markers(bytes: &[u8]) -> bool {
    bytes
        .split(|b| *b == b'\n')
        .any(|line| line.starts_with(b"<<<<<<<") || line.starts_with(b"=======") || line.starts_with(b">>>>>>>"))
}

pub fn hex_sha256(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub added: Vec<IssueId>,
    pub removed: Vec<IssueId>,
    pub modified: Vec<IssueId>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

/// An issue changed on both sides since the common baseline — neither
/// copy can be taken as authoritative without a decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub id: IssueId,
    pub local: Issue,
    pub remote: Issue,
}

/// Fast path: true if the two content hashes differ (§4.4). Callers
/// should only fall through to [`diff`] when this returns true.
pub fn quick_check(local_hash: &str, remote_hash: &str) -> bool {
    local_hash != remote_hash
}

/// Slow path: per-issue diff between two full issue sets.
pub fn diff(local: &[Issue], remote: &[Issue]) -> ChangeSet {
    let local_by_id: HashMap<&IssueId, &Issue> = local.iter().map(|i| (&i.id, i)).collect();
    let remote_by_id: HashMap<&IssueId, &Issue> = remote.iter().map(|i| (&i.id, i)).collect();

    let mut set = ChangeSet::default();
    for (id, remote_issue) in &remote_by_id {
        match local_by_id.get(id) {
            None => set.added.push((*id).clone()),
            Some(local_issue) => {
                if local_issue != remote_issue {
                    set.modified.push((*id).clone());
                }
            }
        }
    }
    for id in local_by_id.keys() {
        if !remote_by_id.contains_key(id) {
            set.removed.push((*id).clone());
        }
    }
    set.added.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    set.removed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    set.modified.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    set
}

/// Of the issues modified on both sides relative to `baseline`,
/// return the ones where local and remote disagree (a true conflict)
/// rather than one side simply re-stating the baseline's value.
pub fn conflicts(baseline: &[Issue], local: &[Issue], remote: &[Issue]) -> Vec<Conflict> {
    let baseline_by_id: HashMap<&IssueId, &Issue> = baseline.iter().map(|i| (&i.id, i)).collect();
    let local_by_id: HashMap<&IssueId, &Issue> = local.iter().map(|i| (&i.id, i)).collect();
    let remote_by_id: HashMap<&IssueId, &Issue> = remote.iter().map(|i| (&i.id, i)).collect();

    let mut out = Vec::new();
    for (id, remote_issue) in &remote_by_id {
        let Some(local_issue) = local_by_id.get(id) else { continue };
        if local_issue == remote_issue {
            continue;
        }
        let base = baseline_by_id.get(id).copied();
        let local_changed = base != Some(*local_issue);
        let remote_changed = base != Some(*remote_issue);
        if local_changed && remote_changed {
            out.push(Conflict { id: (*id).clone(), local: (*local_issue).clone(), remote: (*remote_issue).clone() });
        }
    }
    out.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
    out
}
