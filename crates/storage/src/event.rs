// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The event log vocabulary. Every state change reaches
//! [`crate::state::MaterializedState`] as one of these facts, appended
//! to the WAL before it takes effect.

use serde::{Deserialize, Serialize};

use bd_core::{Comment, DecisionPoint, Dependency, DependencyType, Issue, IssueId, IssueUpdate};
use bd_core::{DecisionId, ScanEvent, SpecRegistryEntry};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    IssueCreated {
        issue: Box<Issue>,
    },
    IssueUpdated {
        id: IssueId,
        update: Box<IssueUpdate>,
    },
    IssueClosed {
        id: IssueId,
        reason: Option<String>,
        closed_by_session: Option<String>,
        closed_at: u64,
    },
    IssueReopened {
        id: IssueId,
        updated_at: u64,
    },
    IssueDeleted {
        id: IssueId,
    },
    /// A delete that couldn't be a hard delete because other issues
    /// still depend on it (§9 Open Question resolution: tombstone
    /// rather than refuse).
    IssueTombstoned {
        id: IssueId,
        tombstoned_at: u64,
    },
    DependencyAdded {
        dependency: Box<Dependency>,
    },
    DependencyRemoved {
        issue_id: IssueId,
        depends_on_id: IssueId,
        dep_type: DependencyType,
    },
    LabelAdded {
        issue_id: IssueId,
        label: String,
    },
    LabelRemoved {
        issue_id: IssueId,
        label: String,
    },
    CommentAdded {
        comment: Box<Comment>,
    },
    DecisionCreated {
        decision: Box<DecisionPoint>,
    },
    DecisionResponded {
        id: DecisionId,
        responded_at: u64,
        responded_by: String,
        selected_option: Option<String>,
        response_text: Option<String>,
        guidance: Option<String>,
    },
    DecisionReminderSent {
        id: DecisionId,
        reminder_count: u32,
    },
    MoleculePoured {
        issue: Box<Issue>,
        edges: Vec<Dependency>,
    },
    ScanEventRecorded {
        event: Box<ScanEvent>,
    },
    SpecRegistryUpserted {
        entry: Box<SpecRegistryEntry>,
    },
    /// Set a single key in the store's metadata table (last import
    /// hash/mtime, last export hash, and friends).
    MetadataSet {
        key: String,
        value: String,
    },
    /// Clear the dirty set after a successful export (§4.4).
    DirtyIssuesCleared {
        ids: Vec<IssueId>,
    },
    /// Control event: daemon is tearing down. Carries no state change;
    /// the engine loop skips it rather than applying it.
    Shutdown,
}
