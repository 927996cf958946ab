// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `StorageAdapter`: the seam between the wire/daemon layer and
//! persistence. Consumers depend on this trait rather than
//! [`EventSourcedStore`] directly so that a fake backend can stand in
//! for integration tests without a real WAL on disk.

use async_trait::async_trait;

use bd_core::{
    Clock, Comment, CoreResult, DecisionPoint, Dependency, DependencyType, DependentWithMetadata, Issue, IssueId,
    IssueUpdate, ScanEvent, SpecRegistryEntry, SpecRegistryState, SystemClock,
};

use crate::state::MaterializedState;
use crate::store::EventSourcedStore;

#[async_trait]
pub trait StorageAdapter: Send + Sync {
    async fn create_issue(&self, issue: Issue) -> CoreResult<Issue>;
    async fn get_issue(&self, token: &str) -> CoreResult<Issue>;
    async fn update_issue(&self, token: &str, update: IssueUpdate) -> CoreResult<Issue>;
    async fn close_issue(&self, token: &str, reason: Option<String>, session: Option<String>) -> CoreResult<Issue>;
    async fn reopen_issue(&self, token: &str) -> CoreResult<Issue>;
    async fn delete_issues(&self, tokens: &[String]) -> CoreResult<Vec<IssueId>>;

    async fn add_dependency(&self, issue_id: &str, depends_on_id: &str, dep_type: DependencyType) -> CoreResult<Dependency>;
    async fn remove_dependency(&self, issue_id: &str, depends_on_id: &str, dep_type: DependencyType) -> CoreResult<()>;
    async fn get_dependents(&self, token: &str) -> CoreResult<Vec<Issue>>;
    async fn get_dependents_with_metadata(&self, token: &str) -> CoreResult<Vec<DependentWithMetadata>>;
    async fn get_dependencies(&self, token: &str) -> CoreResult<Vec<Issue>>;

    async fn add_label(&self, token: &str, label: String) -> CoreResult<Issue>;
    async fn remove_label(&self, token: &str, label: String) -> CoreResult<Issue>;

    async fn add_comment(&self, token: &str, author: String, body: String) -> CoreResult<Comment>;

    async fn create_decision(&self, decision: DecisionPoint) -> CoreResult<DecisionPoint>;
    async fn get_decision(&self, id: &str) -> CoreResult<DecisionPoint>;
    async fn list_decisions(&self) -> CoreResult<Vec<DecisionPoint>>;
    async fn resolve_decision(
        &self,
        id: &str,
        responded_by: String,
        selected_option: Option<String>,
        response_text: Option<String>,
        guidance: Option<String>,
    ) -> CoreResult<DecisionPoint>;
    async fn remind_decision(&self, id: &str) -> CoreResult<DecisionPoint>;

    async fn pour_molecule(&self, template_token: &str, vars: std::collections::HashMap<String, String>) -> CoreResult<Issue>;

    async fn resolve_issue_id(&self, token: &str) -> CoreResult<IssueId>;
    async fn list_issues(&self) -> CoreResult<Vec<Issue>>;
    async fn ready_work(&self) -> CoreResult<Vec<Issue>>;
    async fn content_hash(&self) -> CoreResult<String>;

    async fn record_scan_event(&self, spec_id: String, fingerprint: String) -> CoreResult<ScanEvent>;
    async fn list_scan_events(&self) -> CoreResult<Vec<ScanEvent>>;
    async fn upsert_spec_registry(&self, spec_id: String, fingerprint: String, state: SpecRegistryState) -> CoreResult<SpecRegistryEntry>;
    async fn get_spec_registry_entry(&self, spec_id: &str) -> CoreResult<SpecRegistryEntry>;
    async fn list_spec_registry(&self) -> CoreResult<Vec<SpecRegistryEntry>>;

    /// IDs touched since the last export, per the Change Detector's
    /// dirty-set bookkeeping (§4.4).
    async fn dirty_issues(&self) -> CoreResult<Vec<IssueId>>;

    /// Snapshot the current state for callers (e.g. the Change
    /// Detector, molecule pouring) that need a point-in-time, owned
    /// copy rather than a lock held across an `.await`.
    async fn snapshot(&self) -> MaterializedState;
}

/// Adapt [`EventSourcedStore`] (behind an `Arc`) to [`StorageAdapter`].
pub struct EventSourcedAdapter<C: Clock = SystemClock> {
    store: std::sync::Arc<EventSourcedStore<C>>,
}

impl<C: Clock> EventSourcedAdapter<C> {
    pub fn new(store: std::sync::Arc<EventSourcedStore<C>>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<C: Clock + 'static> StorageAdapter for EventSourcedAdapter<C> {
    async fn create_issue(&self, issue: Issue) -> CoreResult<Issue> {
        self.store.create_issue(issue).await
    }

    async fn get_issue(&self, token: &str) -> CoreResult<Issue> {
        self.store.get_issue(token).await
    }

    async fn update_issue(&self, token: &str, update: IssueUpdate) -> CoreResult<Issue> {
        self.store.update_issue(token, update).await
    }

    async fn close_issue(&self, token: &str, reason: Option<String>, session: Option<String>) -> CoreResult<Issue> {
        self.store.close_issue(token, reason, session).await
    }

    async fn reopen_issue(&self, token: &str) -> CoreResult<Issue> {
        self.store.reopen_issue(token).await
    }

    async fn delete_issues(&self, tokens: &[String]) -> CoreResult<Vec<IssueId>> {
        self.store.delete_issues(tokens).await
    }

    async fn add_dependency(&self, issue_id: &str, depends_on_id: &str, dep_type: DependencyType) -> CoreResult<Dependency> {
        self.store.add_dependency(issue_id, depends_on_id, dep_type).await
    }

    async fn remove_dependency(&self, issue_id: &str, depends_on_id: &str, dep_type: DependencyType) -> CoreResult<()> {
        self.store.remove_dependency(issue_id, depends_on_id, dep_type).await
    }

    async fn get_dependents(&self, token: &str) -> CoreResult<Vec<Issue>> {
        self.store.get_dependents(token).await
    }

    async fn get_dependents_with_metadata(&self, token: &str) -> CoreResult<Vec<DependentWithMetadata>> {
        self.store.get_dependents_with_metadata(token).await
    }

    async fn get_dependencies(&self, token: &str) -> CoreResult<Vec<Issue>> {
        self.store.get_dependencies(token).await
    }

    async fn add_label(&self, token: &str, label: String) -> CoreResult<Issue> {
        self.store.add_label(token, label).await
    }

    async fn remove_label(&self, token: &str, label: String) -> CoreResult<Issue> {
        self.store.remove_label(token, label).await
    }

    async fn add_comment(&self, token: &str, author: String, body: String) -> CoreResult<Comment> {
        self.store.add_comment(token, author, body).await
    }

    async fn create_decision(&self, decision: DecisionPoint) -> CoreResult<DecisionPoint> {
        self.store.create_decision(decision).await
    }

    async fn get_decision(&self, id: &str) -> CoreResult<DecisionPoint> {
        self.store.get_decision(id).await
    }

    async fn list_decisions(&self) -> CoreResult<Vec<DecisionPoint>> {
        self.store.list_decisions().await
    }

    async fn resolve_decision(
        &self,
        id: &str,
        responded_by: String,
        selected_option: Option<String>,
        response_text: Option<String>,
        guidance: Option<String>,
    ) -> CoreResult<DecisionPoint> {
        self.store.resolve_decision(id, responded_by, selected_option, response_text, guidance).await
    }

    async fn remind_decision(&self, id: &str) -> CoreResult<DecisionPoint> {
        self.store.remind_decision(id).await
    }

    async fn pour_molecule(&self, template_token: &str, vars: std::collections::HashMap<String, String>) -> CoreResult<Issue> {
        self.store.pour_molecule(template_token, vars).await
    }

    async fn resolve_issue_id(&self, token: &str) -> CoreResult<IssueId> {
        self.store.resolve_issue_id(token).await
    }

    async fn list_issues(&self) -> CoreResult<Vec<Issue>> {
        self.store.list_issues().await
    }

    async fn ready_work(&self) -> CoreResult<Vec<Issue>> {
        self.store.ready_work().await
    }

    async fn content_hash(&self) -> CoreResult<String> {
        self.store.content_hash().await
    }

    async fn record_scan_event(&self, spec_id: String, fingerprint: String) -> CoreResult<ScanEvent> {
        self.store.record_scan_event(spec_id, fingerprint).await
    }

    async fn list_scan_events(&self) -> CoreResult<Vec<ScanEvent>> {
        self.store.list_scan_events().await
    }

    async fn upsert_spec_registry(&self, spec_id: String, fingerprint: String, state: SpecRegistryState) -> CoreResult<SpecRegistryEntry> {
        self.store.upsert_spec_registry(spec_id, fingerprint, state).await
    }

    async fn get_spec_registry_entry(&self, spec_id: &str) -> CoreResult<SpecRegistryEntry> {
        self.store.get_spec_registry_entry(spec_id).await
    }

    async fn list_spec_registry(&self) -> CoreResult<Vec<SpecRegistryEntry>> {
        self.store.list_spec_registry().await
    }

    async fn dirty_issues(&self) -> CoreResult<Vec<IssueId>> {
        self.store.dirty_issues().await
    }

    async fn snapshot(&self) -> MaterializedState {
        self.store.snapshot().await
    }
}
