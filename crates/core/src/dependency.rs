// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directed, typed edges between Issues.

use serde::{Deserialize, Serialize};

use crate::issue::IssueId;

crate::define_id! {
    /// Dependency edge identifier.
    pub struct DependencyId("dep-");
}

crate::simple_display! {
    DependencyType {
        Blocks => "blocks",
        ParentChild => "parent-child",
        RelatesTo => "relates-to",
        Tracks => "tracks",
        DiscoveredFrom => "discovered-from",
        Related => "related",
        Supersedes => "supersedes",
        Duplicates => "duplicates",
        RepliesTo => "replies-to",
        ApprovedBy => "approved-by",
        AuthoredBy => "authored-by",
        AssignedTo => "assigned-to",
        Until => "until",
        CausedBy => "caused-by",
        Validates => "validates",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyType {
    Blocks,
    ParentChild,
    RelatesTo,
    Tracks,
    DiscoveredFrom,
    Related,
    Supersedes,
    Duplicates,
    RepliesTo,
    ApprovedBy,
    AuthoredBy,
    AssignedTo,
    Until,
    CausedBy,
    Validates,
}

impl DependencyType {
    /// Edge types on which cycle prevention is enforced at insert time
    /// (§9 "enforce acyclicity on additions of type `blocks` and
    /// `parent-child` by a bounded DFS at insert time").
    pub fn enforces_acyclicity(&self) -> bool {
        matches!(self, DependencyType::Blocks | DependencyType::ParentChild)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: DependencyId,
    pub issue_id: IssueId,
    pub depends_on_id: IssueId,
    #[serde(rename = "type")]
    pub dep_type: DependencyType,
    pub created_at: u64,
}

/// A dependent issue paired with the edge that makes it one (§4.2
/// `GetDependentsWithMetadata`): callers that only need the issues can
/// use `GetDependents`, but some need the edge's type and creation time
/// too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependentWithMetadata {
    pub issue: crate::issue::Issue,
    pub dependency: Dependency,
}
