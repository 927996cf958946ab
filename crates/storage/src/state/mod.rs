// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state derived by replaying the event log.

mod decisions;
mod issues;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use bd_core::{
    CoreError, CoreResult, DecisionId, DecisionPoint, DependencyId, DependencyType, ScanEvent,
    ScanEventId, SpecRegistryEntry, SpecRegistryId,
};
use bd_core::{Comment, CommentId, Dependency, Issue, IssueId};

use crate::event::Event;

/// Derived from WAL replay. Holds every entity kind the system tracks.
///
/// # Idempotency
///
/// Every `apply_*` handler MUST be idempotent: applying the same event
/// twice produces the same state as applying it once, because events
/// may be applied both for immediate visibility after a write and
/// again when the WAL entry is later replayed. Handlers use assignment
/// rather than increment/accumulate, and guard inserts/removes with
/// existence checks.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub issues: HashMap<IssueId, Issue>,
    pub dependencies: HashMap<DependencyId, Dependency>,
    pub comments: HashMap<CommentId, Comment>,
    pub decisions: HashMap<DecisionId, DecisionPoint>,
    #[serde(default)]
    pub scan_events: HashMap<ScanEventId, ScanEvent>,
    #[serde(default)]
    pub spec_registry: HashMap<SpecRegistryId, SpecRegistryEntry>,
    /// Issues whose `content_hash` has changed since the last export
    /// (§4.4): the Change Detector's export path only needs to rehash
    /// and re-serialize these.
    #[serde(default)]
    pub dirty_issues: HashSet<IssueId>,
    /// Free-form key/value bookkeeping: `last_import_hash`,
    /// `last_import_mtime`, `jsonl_file_hash`, `export_hashes`.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl MaterializedState {
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::IssueCreated { .. }
            | Event::IssueUpdated { .. }
            | Event::IssueClosed { .. }
            | Event::IssueReopened { .. }
            | Event::IssueDeleted { .. }
            | Event::IssueTombstoned { .. }
            | Event::DependencyAdded { .. }
            | Event::DependencyRemoved { .. }
            | Event::LabelAdded { .. }
            | Event::LabelRemoved { .. }
            | Event::CommentAdded { .. }
            | Event::MoleculePoured { .. }
            | Event::ScanEventRecorded { .. }
            | Event::SpecRegistryUpserted { .. } => issues::apply(self, event),

            Event::DecisionCreated { .. }
            | Event::DecisionResponded { .. }
            | Event::DecisionReminderSent { .. } => decisions::apply(self, event),

            Event::MetadataSet { key, value } => {
                self.metadata.insert(key.clone(), value.clone());
            }
            Event::DirtyIssuesCleared { ids } => {
                for id in ids {
                    self.dirty_issues.remove(id);
                }
            }

            Event::Shutdown => {}
        }
    }

    /// Resolve a full or partial ID to a canonical `IssueId`, per the
    /// ID Resolver (§4.3).
    pub fn resolve_issue_id(&self, token: &str) -> CoreResult<IssueId> {
        let mut ids: Vec<&str> = self.issues.keys().map(|id| id.as_str()).collect();
        ids.sort_unstable();
        match bd_core::resolve_id(token, &ids) {
            bd_core::ResolveOutcome::Unique(id) => Ok(IssueId::from_string(id)),
            bd_core::ResolveOutcome::Ambiguous(candidates) => Err(CoreError::Ambiguous {
                prefix: token.to_string(),
                candidates: candidates.into_iter().map(String::from).collect(),
            }),
            bd_core::ResolveOutcome::NotFound => Err(CoreError::NotFound(token.to_string())),
        }
    }

    pub fn get_issue(&self, token: &str) -> CoreResult<&Issue> {
        let id = self.resolve_issue_id(token)?;
        self.issues.get(&id).ok_or_else(|| CoreError::NotFound(token.to_string()))
    }

    pub fn dependencies_of(&self, id: &IssueId) -> Vec<&Dependency> {
        self.dependencies.values().filter(|d| d.issue_id == *id).collect()
    }

    pub fn dependents_of(&self, id: &IssueId) -> Vec<&Dependency> {
        self.dependencies.values().filter(|d| d.depends_on_id == *id).collect()
    }

    /// Bounded DFS reachability check used to enforce acyclicity before
    /// inserting a `blocks`/`parent-child` edge (§9). Returns true if
    /// `to` is reachable from `from` by following edges of `dep_type`
    /// in the `depends_on` direction.
    pub fn has_path(&self, from: &IssueId, to: &IssueId, dep_type: DependencyType) -> bool {
        let mut stack = vec![from.clone()];
        let mut seen = std::collections::HashSet::new();
        while let Some(current) = stack.pop() {
            if current == *to {
                return true;
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            for dep in self.dependencies.values() {
                if dep.issue_id == current && dep.dep_type == dep_type {
                    stack.push(dep.depends_on_id.clone());
                }
            }
        }
        false
    }

    /// Issues that are open, not template/ephemeral, not deferred into
    /// the future, and have no open blocking dependency (§4 "ready
    /// work" query).
    pub fn ready_work(&self, now_ms: u64) -> Vec<&Issue> {
        self.issues
            .values()
            .filter(|issue| {
                matches!(issue.status, bd_core::Status::Open)
                    && !issue.is_template
                    && !issue.ephemeral
                    && issue.defer_until.map(|t| t <= now_ms).unwrap_or(true)
                    && !self.is_blocked(&issue.id)
            })
            .collect()
    }

    pub fn is_blocked(&self, id: &IssueId) -> bool {
        self.dependencies.values().any(|dep| {
            dep.issue_id == *id
                && dep.dep_type == DependencyType::Blocks
                && self.issues.get(&dep.depends_on_id).map(|blocker| !blocker.status.is_closed()).unwrap_or(false)
        })
    }

    /// Content hash over every non-tombstone issue, sorted by ID
    /// (§3.2 invariant 4, §4.4).
    pub fn content_hash(&self) -> String {
        let mut issues: Vec<&Issue> = self.issues.values().filter(|i| !matches!(i.status, bd_core::Status::Tombstone)).collect();
        issues.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        bd_core::content_hash(issues)
    }
}
