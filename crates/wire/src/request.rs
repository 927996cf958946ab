// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operations the daemon accepts over the wire (§4.1).

use bd_core::{DependencyType, Issue, IssueUpdate, SpecRegistryState};
use serde::{Deserialize, Serialize};

/// Request from client to daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// TCP auth handshake (§6.3). Not sent over the Unix socket, which
    /// is trusted by filesystem permissions alone.
    Hello { token: String },

    Health,

    Create { issue: Box<Issue> },
    Update { id: String, update: Box<IssueUpdate> },
    UpdateWithComment { id: String, update: Box<IssueUpdate>, author: String, comment: String },
    Show { id: String },
    ResolveId { token: String },
    /// Bulk delete (§4.1): leaf issues are hard-deleted, issues with
    /// dependents are tombstoned instead.
    Delete { ids: Vec<String> },
    CloseIssue { id: String, reason: Option<String>, closed_by_session: Option<String> },
    ReopenIssue { id: String },

    /// Filtered search over the full issue set.
    List {
        #[serde(default)]
        status: Option<String>,
        #[serde(default)]
        issue_type: Option<String>,
        #[serde(default)]
        label: Option<String>,
    },
    ReadyWork,

    AddDependency { issue_id: String, depends_on_id: String, dep_type: DependencyType },
    RemoveDependency { issue_id: String, depends_on_id: String, dep_type: DependencyType },
    GetDependencies { id: String },
    GetDependents { id: String },
    GetDependentsWithMetadata { id: String },

    AddLabel { id: String, label: String },
    RemoveLabel { id: String, label: String },

    AddComment { id: String, author: String, body: String },

    /// Instantiate a Molecule template (§4 molecule pouring).
    Pour { template_id: String, bindings: std::collections::BTreeMap<String, String> },

    DecisionCreate { decision: Box<bd_core::DecisionPoint> },
    DecisionList,
    DecisionGet { id: String },
    DecisionResolve {
        id: String,
        responded_by: String,
        selected_option: Option<String>,
        response_text: Option<String>,
        guidance: Option<String>,
    },

    /// Spec-scan bookkeeping (§4 spec-scan).
    RecordScanEvent { spec_id: String, fingerprint: String },
    ListScanEvents,
    UpsertSpecRegistry { spec_id: String, fingerprint: String, state: SpecRegistryState },
    ListSpecRegistry,
}
