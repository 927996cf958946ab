// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event handlers for issues, dependencies, labels, comments, and the
//! spec-scan bookkeeping entities.

use bd_core::{IssueId, IssueUpdate};

use super::MaterializedState;
use crate::event::Event;

pub(super) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::IssueCreated { issue } => {
            let inserted = state.issues.entry(issue.id.clone()).or_insert_with(|| (**issue).clone()).id.clone();
            mark_dirty_and_rehash(state, &inserted);
        }
        Event::IssueUpdated { id, update } => {
            if let Some(issue) = state.issues.get_mut(id) {
                apply_update(issue, update);
            }
            mark_dirty_and_rehash(state, id);
        }
        Event::IssueClosed { id, reason, closed_by_session, closed_at } => {
            if let Some(issue) = state.issues.get_mut(id) {
                issue.status = bd_core::Status::Closed;
                issue.closed_at = Some(*closed_at);
                issue.close_reason = reason.clone();
                issue.closed_by_session = closed_by_session.clone();
                issue.updated_at = *closed_at;
            }
            mark_dirty_and_rehash(state, id);
        }
        Event::IssueReopened { id, updated_at } => {
            if let Some(issue) = state.issues.get_mut(id) {
                issue.status = bd_core::Status::Open;
                issue.closed_at = None;
                issue.close_reason = None;
                issue.closed_by_session = None;
                issue.updated_at = *updated_at;
            }
            mark_dirty_and_rehash(state, id);
        }
        Event::IssueDeleted { id } => {
            // Hard delete: only reachable for leaf issues with no
            // referencing dependency edges (§9 Open Question
            // resolution). Issues with dependents are tombstoned
            // instead, via `IssueTombstoned`.
            state.issues.remove(id);
            state.dependencies.retain(|_, dep| dep.issue_id != *id && dep.depends_on_id != *id);
            state.comments.retain(|_, c| c.issue_id != *id);
            state.dirty_issues.remove(id);
        }
        Event::IssueTombstoned { id, tombstoned_at } => {
            if let Some(issue) = state.issues.get_mut(id) {
                issue.status = bd_core::Status::Tombstone;
                issue.updated_at = *tombstoned_at;
            }
            mark_dirty_and_rehash(state, id);
        }
        Event::DependencyAdded { dependency } => {
            state.dependencies.entry(dependency.id.clone()).or_insert_with(|| (**dependency).clone());
        }
        Event::DependencyRemoved { issue_id, depends_on_id, dep_type } => {
            state.dependencies.retain(|_, dep| {
                !(dep.issue_id == *issue_id && dep.depends_on_id == *depends_on_id && dep.dep_type == *dep_type)
            });
        }
        Event::LabelAdded { issue_id, label } => {
            if let Some(issue) = state.issues.get_mut(issue_id) {
                if !issue.labels.iter().any(|l| l == label) {
                    issue.labels.push(label.clone());
                }
            }
            mark_dirty_and_rehash(state, issue_id);
        }
        Event::LabelRemoved { issue_id, label } => {
            if let Some(issue) = state.issues.get_mut(issue_id) {
                issue.labels.retain(|l| l != label);
            }
            mark_dirty_and_rehash(state, issue_id);
        }
        Event::CommentAdded { comment } => {
            state.comments.entry(comment.id.clone()).or_insert_with(|| (**comment).clone());
        }
        Event::MoleculePoured { issue, edges } => {
            let inserted = state.issues.entry(issue.id.clone()).or_insert_with(|| (**issue).clone()).id.clone();
            for edge in edges {
                state.dependencies.entry(edge.id.clone()).or_insert_with(|| edge.clone());
            }
            mark_dirty_and_rehash(state, &inserted);
        }
        Event::ScanEventRecorded { event } => {
            state.scan_events.entry(event.id.clone()).or_insert_with(|| (**event).clone());
        }
        Event::SpecRegistryUpserted { entry } => {
            state.spec_registry.insert(entry.id.clone(), (**entry).clone());
        }
        _ => unreachable!("dispatched only issue-domain events"),
    }
}

/// Recompute an issue's per-issue content hash and mark it dirty for
/// the next export (§4.4). The hash is taken over the issue with its
/// own `content_hash` field cleared first, so the stored digest never
/// folds in a stale copy of itself.
fn mark_dirty_and_rehash(state: &mut MaterializedState, id: &IssueId) {
    let Some(issue) = state.issues.get(id) else { return };
    let mut bare = issue.clone();
    bare.content_hash = None;
    let digest = bd_core::content_hash(std::iter::once(&bare));
    if let Some(issue) = state.issues.get_mut(id) {
        issue.content_hash = Some(digest);
    }
    state.dirty_issues.insert(id.clone());
}

fn apply_update(issue: &mut bd_core::Issue, update: &IssueUpdate) {
    if let Some(title) = &update.title {
        issue.title = title.clone();
    }
    if let Some(v) = &update.description {
        issue.description = v.clone();
    }
    if let Some(v) = &update.design {
        issue.design = v.clone();
    }
    if let Some(v) = &update.acceptance_criteria {
        issue.acceptance_criteria = v.clone();
    }
    if let Some(v) = &update.notes {
        issue.notes = v.clone();
    }
    if let Some(v) = update.issue_type {
        issue.issue_type = v;
    }
    if let Some(v) = update.priority {
        issue.priority = v;
    }
    if let Some(v) = &update.assignee {
        issue.assignee = v.clone().map(Into::into);
    }
    if let Some(v) = &update.spec_id {
        issue.spec_id = v.clone();
    }
    if let Some(v) = &update.external_ref {
        issue.external_ref = v.clone();
    }
    if let Some(v) = &update.source_system {
        issue.source_system = v.clone();
    }
    if let Some(v) = update.estimated_minutes {
        issue.estimated_minutes = v;
    }
    if let Some(v) = update.pinned {
        issue.pinned = v;
    }
    if let Some(v) = update.quality_score {
        issue.quality_score = v;
    }
    if let Some(v) = update.due_at {
        issue.due_at = v;
    }
    if let Some(v) = update.defer_until {
        issue.defer_until = v;
    }
    issue.updated_at = update.updated_at;
}
