// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The canonical work item.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

crate::define_id! {
    /// Canonical Issue identifier, `bd-<nanoid>`.
    pub struct IssueId("bd-i");
}

crate::simple_display! {
    IssueType {
        Task => "task",
        Bug => "bug",
        Feature => "feature",
        Epic => "epic",
        Advice => "advice",
        Gate => "gate",
        Chore => "chore",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Task,
    Bug,
    Feature,
    Epic,
    Advice,
    Gate,
    Chore,
}

crate::simple_display! {
    Status {
        Open => "open",
        InProgress => "in_progress",
        Blocked => "blocked",
        Closed => "closed",
        Tombstone => "tombstone",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Open,
    InProgress,
    Blocked,
    Closed,
    Tombstone,
}

impl Status {
    /// Invariant 2: `status = closed` iff `closed_at` is set.
    pub fn is_closed(&self) -> bool {
        matches!(self, Status::Closed)
    }
}

crate::simple_display! {
    AdviceHookTrigger {
        SessionEnd => "session-end",
        BeforeCommit => "before-commit",
        BeforePush => "before-push",
        BeforeHandoff => "before-handoff",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdviceHookTrigger {
    SessionEnd,
    BeforeCommit,
    BeforePush,
    BeforeHandoff,
}

crate::simple_display! {
    AdviceHookOnFailure {
        Block => "block",
        Warn => "warn",
        Ignore => "ignore",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceHookOnFailure {
    Block,
    Warn,
    Ignore,
}

/// Upper bound on `hook_timeout_secs` (§5 "hard timeout bounded by
/// `hookTimeoutMax`").
pub const HOOK_TIMEOUT_MAX_SECS: u32 = 600;

/// Upper bound on `title` byte length.
pub const TITLE_MAX_LEN: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance_criteria: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub issue_type: IssueType,
    pub status: Status,
    /// 1 (highest) through 5 (lowest).
    pub priority: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<SmolStr>,
    pub created_at: u64,
    pub updated_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_by_session: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_system: Option<String>,
    #[serde(default)]
    pub estimated_minutes: u32,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub is_template: bool,
    #[serde(default)]
    pub ephemeral: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defer_until: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,

    // Advice-issue hook fields (§3.1). Only meaningful when
    // `issue_type == Advice`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_trigger: Option<AdviceHookTrigger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_timeout_secs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_on_failure: Option<AdviceHookOnFailure>,

    /// Unknown fields from older/newer snapshot formats, preserved
    /// round-trip per §6.2.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Issue {
    /// Validate field-level constraints independent of storage state.
    /// Referential/uniqueness invariants are enforced by the adapter.
    pub fn validate(&self) -> crate::CoreResult<()> {
        if self.title.is_empty() {
            return Err(crate::CoreError::Validation("title must not be empty".into()));
        }
        if self.title.len() > TITLE_MAX_LEN {
            return Err(crate::CoreError::Validation(format!(
                "title exceeds {TITLE_MAX_LEN} bytes"
            )));
        }
        if !(1..=5).contains(&self.priority) {
            return Err(crate::CoreError::Validation("priority must be 1-5".into()));
        }
        if self.status.is_closed() != self.closed_at.is_some() {
            return Err(crate::CoreError::Validation(
                "status=closed iff closed_at is set".into(),
            ));
        }
        if let Some(timeout) = self.hook_timeout_secs {
            if timeout > HOOK_TIMEOUT_MAX_SECS {
                return Err(crate::CoreError::Validation(format!(
                    "hook_timeout_secs exceeds {HOOK_TIMEOUT_MAX_SECS}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "issue_tests.rs"]
mod tests;
