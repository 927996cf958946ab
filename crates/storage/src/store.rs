// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The concrete event-sourced store: WAL-backed, guarded by a single
//! `tokio::sync::Mutex` since every write first appends to the WAL
//! (inherently serialized) before touching in-memory state.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::warn;

use bd_core::{Clock, Comment, CommentId, CoreError, CoreResult, DecisionId, DecisionPoint};
use bd_core::{Dependency, DependencyId, DependencyType, DependentWithMetadata, Issue, IssueId, IssueUpdate, SystemClock};
use bd_core::{ScanEvent, ScanEventId, SpecRegistryEntry, SpecRegistryId, SpecRegistryState};

use crate::change_detector::{self, ImportMetadata, ImportStatus};
use crate::checkpoint::{CheckpointResult, Checkpointer};
use crate::event::Event;
use crate::export;
use crate::state::MaterializedState;
use crate::wal::{Wal, WalError};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("wal error: {0}")]
    Wal(#[from] WalError),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] crate::checkpoint::SnapshotError),
}

fn wal_err(e: WalError) -> CoreError {
    CoreError::Internal(e.to_string())
}

struct Inner {
    wal: Wal,
    state: MaterializedState,
}

impl Inner {
    fn append(&mut self, event: Event) -> CoreResult<()> {
        self.wal.append(&event).map_err(wal_err)?;
        self.state.apply_event(&event);
        if self.wal.needs_flush() {
            if let Err(e) = self.wal.flush() {
                warn!("failed to flush wal: {e}");
            }
        }
        Ok(())
    }
}

/// Generic over the clock so tests can drive time with [`FakeClock`];
/// the daemon binary uses the default [`SystemClock`].
///
/// [`FakeClock`]: bd_core::FakeClock
pub struct EventSourcedStore<C: Clock = SystemClock> {
    inner: Mutex<Inner>,
    clock: C,
    snapshot_path: Option<PathBuf>,
}

/// Outcome of replaying the WAL on top of the loaded (or empty)
/// snapshot at startup.
pub struct RecoveryReport {
    pub snapshot_seq: u64,
    pub replayed_events: u64,
}

impl<C: Clock + 'static> EventSourcedStore<C> {
    /// Load the snapshot at `snapshot_path` (if any), open the WAL at
    /// `wal_path`, and replay every entry not yet reflected in the
    /// snapshot.
    pub fn open(
        wal_path: impl AsRef<Path>,
        snapshot_path: Option<PathBuf>,
        clock: C,
    ) -> Result<(Self, RecoveryReport), StorageError> {
        let (mut state, processed_seq) = match &snapshot_path {
            Some(path) => match Checkpointer::new(path.clone()).load()? {
                Some(snapshot) => (snapshot.state, snapshot.seq),
                None => (MaterializedState::default(), 0),
            },
            None => (MaterializedState::default(), 0),
        };

        let mut wal = Wal::open(wal_path, processed_seq)?;
        let mut replayed = 0u64;
        while let Some(entry) = wal.next_unprocessed()? {
            state.apply_event(&entry.event);
            wal.mark_processed(entry.seq);
            replayed += 1;
        }

        let store = Self { inner: Mutex::new(Inner { wal, state }), clock, snapshot_path };
        Ok((store, RecoveryReport { snapshot_seq: processed_seq, replayed_events: replayed }))
    }

    /// Flush the WAL and write a fresh snapshot at the current
    /// processed sequence. Used on graceful shutdown and periodically
    /// by the daemon to bound WAL replay time on the next restart.
    pub async fn checkpoint(&self) -> Result<Option<CheckpointResult>, StorageError> {
        let Some(path) = &self.snapshot_path else { return Ok(None) };
        let mut inner = self.inner.lock().await;
        inner.wal.flush()?;
        let seq = inner.wal.processed_seq();
        let result = Checkpointer::new(path.clone()).checkpoint_sync(seq, &inner.state)?;
        Ok(Some(result))
    }

    pub async fn create_issue(&self, mut issue: Issue) -> CoreResult<Issue> {
        let now = self.clock.epoch_ms();
        issue.created_at = now;
        issue.updated_at = now;
        issue.validate()?;

        let mut inner = self.inner.lock().await;
        if inner.state.issues.contains_key(&issue.id) {
            return Err(CoreError::Conflict(format!("issue {} already exists", issue.id)));
        }
        inner.append(Event::IssueCreated { issue: Box::new(issue.clone()) })?;
        Ok(issue)
    }

    pub async fn get_issue(&self, token: &str) -> CoreResult<Issue> {
        let inner = self.inner.lock().await;
        inner.state.get_issue(token).cloned()
    }

    pub async fn update_issue(&self, token: &str, mut update: IssueUpdate) -> CoreResult<Issue> {
        let now = self.clock.epoch_ms();
        update.updated_at = now;

        let mut inner = self.inner.lock().await;
        let id = inner.state.resolve_issue_id(token)?;
        inner.append(Event::IssueUpdated { id: id.clone(), update: Box::new(update) })?;
        inner.state.issues.get(&id).cloned().ok_or_else(|| CoreError::NotFound(token.to_string()))
    }

    pub async fn close_issue(&self, token: &str, reason: Option<String>, session: Option<String>) -> CoreResult<Issue> {
        let now = self.clock.epoch_ms();
        let mut inner = self.inner.lock().await;
        let id = inner.state.resolve_issue_id(token)?;
        inner.append(Event::IssueClosed { id: id.clone(), reason, closed_by_session: session, closed_at: now })?;
        inner.state.issues.get(&id).cloned().ok_or_else(|| CoreError::NotFound(token.to_string()))
    }

    pub async fn reopen_issue(&self, token: &str) -> CoreResult<Issue> {
        let now = self.clock.epoch_ms();
        let mut inner = self.inner.lock().await;
        let id = inner.state.resolve_issue_id(token)?;
        inner.append(Event::IssueReopened { id: id.clone(), updated_at: now })?;
        inner.state.issues.get(&id).cloned().ok_or_else(|| CoreError::NotFound(token.to_string()))
    }

    /// Delete (or tombstone) a batch of issues (§4.1 `Delete(ids)`, §9
    /// Open Question resolution). A leaf issue with no dependents is
    /// hard-deleted; one with dependents is tombstoned instead so the
    /// edges pointing at it stay resolvable. Tokens that don't resolve
    /// are skipped rather than aborting the whole batch.
    pub async fn delete_issues(&self, tokens: &[String]) -> CoreResult<Vec<IssueId>> {
        let now = self.clock.epoch_ms();
        let mut inner = self.inner.lock().await;
        let mut processed = Vec::with_capacity(tokens.len());
        for token in tokens {
            let Ok(id) = inner.state.resolve_issue_id(token) else { continue };
            if inner.state.dependents_of(&id).is_empty() {
                inner.append(Event::IssueDeleted { id: id.clone() })?;
            } else {
                inner.append(Event::IssueTombstoned { id: id.clone(), tombstoned_at: now })?;
            }
            processed.push(id);
        }
        Ok(processed)
    }

    pub async fn add_dependency(&self, issue_token: &str, depends_on_token: &str, dep_type: DependencyType) -> CoreResult<Dependency> {
        let now = self.clock.epoch_ms();
        let mut inner = self.inner.lock().await;
        let issue_id = inner.state.resolve_issue_id(issue_token)?;
        let depends_on_id = inner.state.resolve_issue_id(depends_on_token)?;

        if dep_type.enforces_acyclicity() && inner.state.has_path(&depends_on_id, &issue_id, dep_type) {
            return Err(CoreError::Validation(format!("adding this {dep_type} edge would create a cycle")));
        }

        let dependency =
            Dependency { id: DependencyId::new(), issue_id, depends_on_id, dep_type, created_at: now };
        inner.append(Event::DependencyAdded { dependency: Box::new(dependency.clone()) })?;
        Ok(dependency)
    }

    pub async fn remove_dependency(&self, issue_token: &str, depends_on_token: &str, dep_type: DependencyType) -> CoreResult<()> {
        let mut inner = self.inner.lock().await;
        let issue_id = inner.state.resolve_issue_id(issue_token)?;
        let depends_on_id = inner.state.resolve_issue_id(depends_on_token)?;
        inner.append(Event::DependencyRemoved { issue_id, depends_on_id, dep_type })
    }

    pub async fn get_dependencies(&self, token: &str) -> CoreResult<Vec<Issue>> {
        let inner = self.inner.lock().await;
        let id = inner.state.resolve_issue_id(token)?;
        Ok(inner
            .state
            .dependencies_of(&id)
            .into_iter()
            .filter_map(|dep| inner.state.issues.get(&dep.depends_on_id).cloned())
            .collect())
    }

    pub async fn get_dependents(&self, token: &str) -> CoreResult<Vec<Issue>> {
        let inner = self.inner.lock().await;
        let id = inner.state.resolve_issue_id(token)?;
        Ok(inner
            .state
            .dependents_of(&id)
            .into_iter()
            .filter_map(|dep| inner.state.issues.get(&dep.issue_id).cloned())
            .collect())
    }

    /// Like [`Self::get_dependents`] but pairs each dependent issue with
    /// the dependency edge itself (§4.2), for callers that need the
    /// edge's type or creation time rather than just the issue.
    pub async fn get_dependents_with_metadata(&self, token: &str) -> CoreResult<Vec<DependentWithMetadata>> {
        let inner = self.inner.lock().await;
        let id = inner.state.resolve_issue_id(token)?;
        Ok(inner
            .state
            .dependents_of(&id)
            .into_iter()
            .filter_map(|dep| {
                inner.state.issues.get(&dep.issue_id).cloned().map(|issue| DependentWithMetadata { issue, dependency: dep.clone() })
            })
            .collect())
    }

    pub async fn add_label(&self, token: &str, label: String) -> CoreResult<Issue> {
        let mut inner = self.inner.lock().await;
        let id = inner.state.resolve_issue_id(token)?;
        inner.append(Event::LabelAdded { issue_id: id.clone(), label })?;
        inner.state.issues.get(&id).cloned().ok_or_else(|| CoreError::NotFound(token.to_string()))
    }

    pub async fn remove_label(&self, token: &str, label: String) -> CoreResult<Issue> {
        let mut inner = self.inner.lock().await;
        let id = inner.state.resolve_issue_id(token)?;
        inner.append(Event::LabelRemoved { issue_id: id.clone(), label })?;
        inner.state.issues.get(&id).cloned().ok_or_else(|| CoreError::NotFound(token.to_string()))
    }

    pub async fn add_comment(&self, token: &str, author: String, body: String) -> CoreResult<Comment> {
        let now = self.clock.epoch_ms();
        let mut inner = self.inner.lock().await;
        let issue_id = inner.state.resolve_issue_id(token)?;
        let comment = Comment { id: CommentId::new(), issue_id, author, body, created_at: now };
        inner.append(Event::CommentAdded { comment: Box::new(comment.clone()) })?;
        Ok(comment)
    }

    pub async fn create_decision(&self, mut decision: DecisionPoint) -> CoreResult<DecisionPoint> {
        decision.created_at = self.clock.epoch_ms();
        let mut inner = self.inner.lock().await;
        inner.append(Event::DecisionCreated { decision: Box::new(decision.clone()) })?;
        Ok(decision)
    }

    pub async fn get_decision(&self, id: &str) -> CoreResult<DecisionPoint> {
        let inner = self.inner.lock().await;
        inner
            .state
            .decisions
            .get(&DecisionId::from_string(id))
            .cloned()
            .ok_or_else(|| CoreError::NotFound(id.to_string()))
    }

    /// Respond to a decision point. If the response carries `guidance`
    /// and the decision hasn't exhausted `max_iterations`, this creates
    /// a fresh iteration (§9) rather than mutating the responded
    /// decision in place, and returns that new, still-open iteration;
    /// otherwise it returns the now-resolved decision.
    pub async fn resolve_decision(
        &self,
        id: &str,
        responded_by: String,
        selected_option: Option<String>,
        response_text: Option<String>,
        guidance: Option<String>,
    ) -> CoreResult<DecisionPoint> {
        let now = self.clock.epoch_ms();
        let mut inner = self.inner.lock().await;
        let decision_id = DecisionId::from_string(id);
        if !inner.state.decisions.contains_key(&decision_id) {
            return Err(CoreError::NotFound(id.to_string()));
        }
        inner.append(Event::DecisionResponded {
            id: decision_id.clone(),
            responded_at: now,
            responded_by: responded_by.clone(),
            selected_option,
            response_text,
            guidance,
        })?;
        let responded =
            inner.state.decisions.get(&decision_id).cloned().ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        if responded.should_iterate() {
            let next = DecisionPoint {
                id: DecisionId::new(),
                issue_id: responded.issue_id.clone(),
                prompt: responded.prompt.clone(),
                context: responded.context.clone(),
                options: responded.options.clone(),
                default_option: responded.default_option.clone(),
                iteration: responded.iteration + 1,
                max_iterations: responded.max_iterations,
                prior_iteration_id: Some(responded.id.clone()),
                guidance: None,
                requested_by: responded.requested_by.clone(),
                responded_at: None,
                responded_by: None,
                selected_option: None,
                response_text: None,
                reminder_count: 0,
                urgency: responded.urgency.clone(),
                created_at: now,
            };
            inner.append(Event::DecisionCreated { decision: Box::new(next.clone()) })?;
            return Ok(next);
        }

        Ok(responded)
    }

    pub async fn list_decisions(&self) -> CoreResult<Vec<DecisionPoint>> {
        let inner = self.inner.lock().await;
        Ok(inner.state.decisions.values().cloned().collect())
    }

    /// Bump a decision's reminder count without altering its
    /// iteration or resolution (§9: reminder_count is independent of
    /// iteration).
    pub async fn remind_decision(&self, id: &str) -> CoreResult<DecisionPoint> {
        let mut inner = self.inner.lock().await;
        let decision_id = DecisionId::from_string(id);
        let reminder_count = inner
            .state
            .decisions
            .get(&decision_id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?
            .reminder_count
            + 1;
        inner.append(Event::DecisionReminderSent { id: decision_id.clone(), reminder_count })?;
        inner.state.decisions.get(&decision_id).cloned().ok_or_else(|| CoreError::NotFound(id.to_string()))
    }

    pub async fn pour_molecule(&self, template_token: &str, vars: std::collections::HashMap<String, String>) -> CoreResult<Issue> {
        let now = self.clock.epoch_ms();
        let mut inner = self.inner.lock().await;
        let template_id = inner.state.resolve_issue_id(template_token)?;
        let template = inner.state.issues.get(&template_id).cloned().ok_or_else(|| CoreError::NotFound(template_token.to_string()))?;
        let subgraph = inner.state.dependencies_of(&template_id).into_iter().cloned().collect::<Vec<_>>();

        let new_id = IssueId::new();
        let id_remap = std::collections::HashMap::from([(template_id, new_id)]);
        let (mut issue, edges) = bd_core::pour_molecule(&template, &subgraph, &vars, new_id, &id_remap)
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        issue.created_at = now;
        issue.updated_at = now;
        issue.validate()?;

        inner.append(Event::MoleculePoured { issue: Box::new(issue.clone()), edges })?;
        Ok(issue)
    }

    pub async fn list_issues(&self) -> CoreResult<Vec<Issue>> {
        let inner = self.inner.lock().await;
        Ok(inner.state.issues.values().cloned().collect())
    }

    pub async fn ready_work(&self) -> CoreResult<Vec<Issue>> {
        let now = self.clock.epoch_ms();
        let inner = self.inner.lock().await;
        Ok(inner.state.ready_work(now).into_iter().cloned().collect())
    }

    pub async fn content_hash(&self) -> CoreResult<String> {
        let inner = self.inner.lock().await;
        Ok(inner.state.content_hash())
    }

    pub async fn snapshot(&self) -> MaterializedState {
        self.inner.lock().await.state.clone()
    }

    pub async fn resolve_issue_id(&self, token: &str) -> CoreResult<IssueId> {
        self.inner.lock().await.state.resolve_issue_id(token)
    }

    pub async fn dirty_issues(&self) -> CoreResult<Vec<IssueId>> {
        Ok(self.inner.lock().await.state.dirty_issues.iter().cloned().collect())
    }

    /// Record that a spec file was scanned and produced `fingerprint`
    /// (§4 spec-scan bookkeeping).
    pub async fn record_scan_event(&self, spec_id: String, fingerprint: String) -> CoreResult<ScanEvent> {
        let now = self.clock.epoch_ms();
        let mut inner = self.inner.lock().await;
        let event = ScanEvent { id: ScanEventId::new(), spec_id, fingerprint, detected_at: now };
        inner.append(Event::ScanEventRecorded { event: Box::new(event.clone()) })?;
        Ok(event)
    }

    pub async fn list_scan_events(&self) -> CoreResult<Vec<ScanEvent>> {
        let inner = self.inner.lock().await;
        Ok(inner.state.scan_events.values().cloned().collect())
    }

    /// Create or refresh the spec-registry entry for `spec_id`.
    /// Reuses the existing entry's ID and `created_at` on refresh.
    pub async fn upsert_spec_registry(
        &self,
        spec_id: String,
        fingerprint: String,
        state: SpecRegistryState,
    ) -> CoreResult<SpecRegistryEntry> {
        let now = self.clock.epoch_ms();
        let mut inner = self.inner.lock().await;
        let existing = inner.state.spec_registry.values().find(|e| e.spec_id == spec_id).cloned();
        let entry = SpecRegistryEntry {
            id: existing.as_ref().map(|e| e.id.clone()).unwrap_or_else(SpecRegistryId::new),
            spec_id,
            fingerprint,
            state,
            created_at: existing.as_ref().map(|e| e.created_at).unwrap_or(now),
            updated_at: now,
            missing_at: existing.and_then(|e| e.missing_at),
        };
        inner.append(Event::SpecRegistryUpserted { entry: Box::new(entry.clone()) })?;
        Ok(entry)
    }

    pub async fn get_spec_registry_entry(&self, spec_id: &str) -> CoreResult<SpecRegistryEntry> {
        let inner = self.inner.lock().await;
        inner
            .state
            .spec_registry
            .values()
            .find(|e| e.spec_id == spec_id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(spec_id.to_string()))
    }

    pub async fn list_spec_registry(&self) -> CoreResult<Vec<SpecRegistryEntry>> {
        let inner = self.inner.lock().await;
        Ok(inner.state.spec_registry.values().cloned().collect())
    }

    /// Write the canonical export snapshot (§6.1, §6.2) after checking
    /// the pre-export guard (§4.4), then record the export's hash/mtime
    /// as the new import baseline and clear the dirty set.
    pub async fn export_snapshot(&self, path: &std::path::Path) -> CoreResult<()> {
        let mut inner = self.inner.lock().await;

        let store_is_empty = !inner.state.issues.values().any(|i| !matches!(i.status, bd_core::Status::Tombstone));
        let existing_bytes = std::fs::read(path).unwrap_or_default();
        let snapshot_is_empty = existing_bytes.iter().all(|b| b.is_ascii_whitespace());
        let current_hash = inner.state.content_hash();
        let last_import_hash = inner.state.metadata.get("last_import_hash").cloned().unwrap_or_default();

        change_detector::validate_pre_export(store_is_empty, snapshot_is_empty, &current_hash, &last_import_hash)
            .map_err(|e| CoreError::Conflict(e.to_string()))?;

        export::write_snapshot(path, &inner.state).map_err(|e| CoreError::Internal(e.to_string()))?;

        let bytes = std::fs::read(path).map_err(|e| CoreError::Internal(e.to_string()))?;
        let hash = change_detector::hex_sha256(&bytes);
        let mtime_ms = std::fs::metadata(path)
            .ok()
            .and_then(|m| m.modified().ok())
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_millis().to_string())
            .unwrap_or_default();

        inner.append(Event::MetadataSet { key: "jsonl_file_hash".into(), value: hash.clone() })?;
        inner.append(Event::MetadataSet { key: "last_import_hash".into(), value: hash.clone() })?;
        inner.append(Event::MetadataSet { key: "last_import_mtime".into(), value: mtime_ms })?;
        inner.append(Event::MetadataSet { key: "export_hashes".into(), value: hash })?;

        let dirty: Vec<IssueId> = inner.state.dirty_issues.iter().cloned().collect();
        if !dirty.is_empty() {
            inner.append(Event::DirtyIssuesCleared { ids: dirty })?;
        }
        Ok(())
    }

    /// At startup, check whether the external snapshot at `path` has
    /// drifted from what this store last imported or exported (§4.4).
    /// An empty store bootstraps from the snapshot; a non-empty store
    /// that finds drift only logs it, since merging is a manual step.
    pub async fn reconcile_external_snapshot(&self, path: &std::path::Path) -> CoreResult<()> {
        let mut inner = self.inner.lock().await;
        let meta = ImportMetadata::from_metadata(&inner.state.metadata);

        let (hash, status) = change_detector::check_import(path, &meta).map_err(|e| CoreError::Internal(e.to_string()))?;
        if status == ImportStatus::Unchanged {
            return Ok(());
        }

        let store_is_empty = !inner.state.issues.values().any(|i| !matches!(i.status, bd_core::Status::Tombstone));
        if !store_is_empty {
            warn!("external snapshot at {} diverged from the store; leaving it for manual reconciliation", path.display());
            return Ok(());
        }

        let issues = export::read_snapshot(path).map_err(|e| CoreError::Internal(e.to_string()))?;
        for issue in issues {
            inner.append(Event::IssueCreated { issue: Box::new(issue) })?;
        }
        let mtime_ms = std::fs::metadata(path)
            .ok()
            .and_then(|m| m.modified().ok())
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_millis().to_string())
            .unwrap_or_default();
        inner.append(Event::MetadataSet { key: "last_import_hash".into(), value: hash })?;
        inner.append(Event::MetadataSet { key: "last_import_mtime".into(), value: mtime_ms })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bd_core::test_support::IssueBuilder;
    use bd_core::FakeClock;
    use tempfile::tempdir;

    fn store(dir: &std::path::Path) -> EventSourcedStore<FakeClock> {
        let clock = FakeClock::default();
        let (store, _report) = EventSourcedStore::open(dir.join("events.wal"), Some(dir.join("snapshot.zst")), clock).unwrap();
        store
    }

    #[tokio::test]
    async fn create_and_get_round_trips() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let issue = IssueBuilder::default().title("write the docs").build();
        let id = issue.id.clone();

        store.create_issue(issue).await.unwrap();
        let fetched = store.get_issue(id.as_str()).await.unwrap();
        assert_eq!(fetched.title, "write the docs");
    }

    #[tokio::test]
    async fn duplicate_create_is_a_conflict() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let issue = IssueBuilder::default().build();

        store.create_issue(issue.clone()).await.unwrap();
        let err = store.create_issue(issue).await.unwrap_err();
        assert_eq!(err.tag(), "conflict");
    }

    #[tokio::test]
    async fn closing_sets_closed_at_and_reopening_clears_it() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let issue = IssueBuilder::default().title("fix the bug").build();
        let id = issue.id.clone();
        store.create_issue(issue).await.unwrap();

        let closed = store.close_issue(id.as_str(), None, None).await.unwrap();
        assert_eq!(closed.status, bd_core::Status::Closed);
        assert!(closed.closed_at.is_some());

        let reopened = store.reopen_issue(id.as_str()).await.unwrap();
        assert_eq!(reopened.status, bd_core::Status::Open);
        assert!(reopened.closed_at.is_none());
    }

    #[tokio::test]
    async fn cyclic_blocks_edge_is_rejected() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let a = IssueBuilder::default().build();
        let b = IssueBuilder::default().build();
        let (a_id, b_id) = (a.id.clone(), b.id.clone());
        store.create_issue(a).await.unwrap();
        store.create_issue(b).await.unwrap();

        store.add_dependency(a_id.as_str(), b_id.as_str(), DependencyType::Blocks).await.unwrap();
        let err = store.add_dependency(b_id.as_str(), a_id.as_str(), DependencyType::Blocks).await.unwrap_err();
        assert_eq!(err.tag(), "validation");
    }

    #[tokio::test]
    async fn recovery_replays_wal_on_reopen() {
        let dir = tempdir().unwrap();
        let clock = FakeClock::default();
        let issue = IssueBuilder::default().title("survives restart").build();
        let id = issue.id.clone();
        {
            let (store, _) = EventSourcedStore::open(dir.path().join("events.wal"), None, clock.clone()).unwrap();
            store.create_issue(issue).await.unwrap();
        }

        let (store, report) = EventSourcedStore::open(dir.path().join("events.wal"), None, clock).unwrap();
        assert_eq!(report.replayed_events, 1);
        let fetched = store.get_issue(id.as_str()).await.unwrap();
        assert_eq!(fetched.title, "survives restart");
    }

    #[tokio::test]
    async fn pour_molecule_substitutes_and_persists() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let mut template = IssueBuilder::default().title("deploy {{service}}").build();
        template.is_template = true;
        store.create_issue(template.clone()).await.unwrap();

        let vars = std::collections::HashMap::from([("service".to_string(), "api".to_string())]);
        let poured = store.pour_molecule(template.id.as_str(), vars).await.unwrap();
        assert_eq!(poured.title, "deploy api");
        assert!(!poured.is_template);
        assert_ne!(poured.id, template.id);

        let fetched = store.get_issue(poured.id.as_str()).await.unwrap();
        assert_eq!(fetched.title, "deploy api");
    }

    #[tokio::test]
    async fn remind_decision_increments_without_changing_iteration() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let gate = IssueBuilder::default().build();
        store.create_issue(gate.clone()).await.unwrap();
        let decision = DecisionPoint {
            id: DecisionId::new(),
            issue_id: gate.id,
            prompt: "pick one".into(),
            context: None,
            options: vec![],
            default_option: None,
            iteration: 1,
            max_iterations: 3,
            prior_iteration_id: None,
            guidance: None,
            requested_by: "agent:beads/polecat/fox".into(),
            responded_at: None,
            responded_by: None,
            selected_option: None,
            response_text: None,
            reminder_count: 0,
            urgency: None,
            created_at: 0,
        };
        store.create_decision(decision.clone()).await.unwrap();

        let reminded = store.remind_decision(decision.id.as_str()).await.unwrap();
        assert_eq!(reminded.reminder_count, 1);
        assert_eq!(reminded.iteration, 1);
    }

    #[tokio::test]
    async fn checkpoint_lets_wal_be_truncated_without_losing_state() {
        let dir = tempdir().unwrap();
        let clock = FakeClock::default();
        let issue = IssueBuilder::default().title("checkpointed").build();
        let id = issue.id.clone();
        {
            let (store, _) = EventSourcedStore::open(dir.path().join("events.wal"), Some(dir.path().join("snap.zst")), clock.clone())
                .unwrap();
            store.create_issue(issue).await.unwrap();
            store.checkpoint().await.unwrap();
        }

        let (store, report) =
            EventSourcedStore::open(dir.path().join("events.wal"), Some(dir.path().join("snap.zst")), clock).unwrap();
        assert_eq!(report.replayed_events, 0);
        assert_eq!(store.get_issue(id.as_str()).await.unwrap().title, "checkpointed");
    }

    #[tokio::test]
    async fn deleting_a_leaf_issue_hard_deletes_it() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let issue = IssueBuilder::default().build();
        let id = issue.id.clone();
        store.create_issue(issue).await.unwrap();

        let processed = store.delete_issues(&[id.as_str().to_string()]).await.unwrap();
        assert_eq!(processed, vec![id.clone()]);
        assert_eq!(store.get_issue(id.as_str()).await.unwrap_err().tag(), "not-found");
    }

    #[tokio::test]
    async fn deleting_an_issue_with_dependents_tombstones_it() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let blocker = IssueBuilder::default().build();
        let blocked = IssueBuilder::default().build();
        let (blocker_id, blocked_id) = (blocker.id.clone(), blocked.id.clone());
        store.create_issue(blocker).await.unwrap();
        store.create_issue(blocked).await.unwrap();
        store.add_dependency(blocked_id.as_str(), blocker_id.as_str(), DependencyType::Blocks).await.unwrap();

        store.delete_issues(&[blocker_id.as_str().to_string()]).await.unwrap();

        let tombstoned = store.get_issue(blocker_id.as_str()).await.unwrap();
        assert_eq!(tombstoned.status, bd_core::Status::Tombstone);
        assert_eq!(store.get_dependents(blocker_id.as_str()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unresolvable_tokens_are_skipped_in_a_bulk_delete() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let issue = IssueBuilder::default().build();
        let id = issue.id.clone();
        store.create_issue(issue).await.unwrap();

        let processed = store.delete_issues(&[id.as_str().to_string(), "bd-missing".to_string()]).await.unwrap();
        assert_eq!(processed, vec![id]);
    }

    #[tokio::test]
    async fn resolving_with_guidance_creates_a_fresh_iteration() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let gate = IssueBuilder::default().build();
        store.create_issue(gate.clone()).await.unwrap();
        let decision = DecisionPoint {
            id: DecisionId::new(),
            issue_id: gate.id,
            prompt: "pick one".into(),
            context: None,
            options: vec![],
            default_option: None,
            iteration: 0,
            max_iterations: 3,
            prior_iteration_id: None,
            guidance: None,
            requested_by: "agent:beads/polecat/fox".into(),
            responded_at: None,
            responded_by: None,
            selected_option: None,
            response_text: None,
            reminder_count: 0,
            urgency: None,
            created_at: 0,
        };
        let original_id = decision.id.clone();
        store.create_decision(decision).await.unwrap();

        let next = store
            .resolve_decision(original_id.as_str(), "human:alice".into(), None, Some("not quite".into()), Some("try again".into()))
            .await
            .unwrap();

        assert_eq!(next.iteration, 1);
        assert_eq!(next.prior_iteration_id, Some(original_id.clone()));
        assert!(!next.is_resolved());

        let original = store.get_decision(original_id.as_str()).await.unwrap();
        assert_eq!(original.response_text.as_deref(), Some("not quite"));
    }

    #[tokio::test]
    async fn resolving_without_guidance_resolves_in_place() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let gate = IssueBuilder::default().build();
        store.create_issue(gate.clone()).await.unwrap();
        let decision = DecisionPoint {
            id: DecisionId::new(),
            issue_id: gate.id,
            prompt: "pick one".into(),
            context: None,
            options: vec![],
            default_option: None,
            iteration: 0,
            max_iterations: 3,
            prior_iteration_id: None,
            guidance: None,
            requested_by: "agent:beads/polecat/fox".into(),
            responded_at: None,
            responded_by: None,
            selected_option: None,
            response_text: None,
            reminder_count: 0,
            urgency: None,
            created_at: 0,
        };
        let id = decision.id.clone();
        store.create_decision(decision).await.unwrap();

        let resolved = store.resolve_decision(id.as_str(), "human:alice".into(), Some("a".into()), None, None).await.unwrap();
        assert_eq!(resolved.id, id);
        assert!(resolved.is_resolved());
    }

    #[tokio::test]
    async fn export_then_reconcile_round_trips_into_an_empty_store() {
        let dir = tempdir().unwrap();
        let export_path = dir.path().join("issues.jsonl");

        let db = store(dir.path());
        let issue = IssueBuilder::default().title("exported").build();
        let id = issue.id.clone();
        db.create_issue(issue).await.unwrap();
        db.export_snapshot(&export_path).await.unwrap();

        let fresh_dir = tempdir().unwrap();
        let fresh = store(fresh_dir.path());
        fresh.reconcile_external_snapshot(&export_path).await.unwrap();

        let fetched = fresh.get_issue(id.as_str()).await.unwrap();
        assert_eq!(fetched.title, "exported");
    }

    #[tokio::test]
    async fn spec_registry_upsert_reuses_id_on_refresh() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        let first = store.upsert_spec_registry("spec-1".into(), "fp-1".into(), bd_core::SpecRegistryState::Active).await.unwrap();
        let second = store.upsert_spec_registry("spec-1".into(), "fp-2".into(), bd_core::SpecRegistryState::Done).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.fingerprint, "fp-2");
        assert_eq!(second.created_at, first.created_at);
    }
}
