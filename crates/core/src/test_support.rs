// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test-only builders, gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::issue::{Issue, IssueId, IssueType, Status};

pub struct IssueBuilder {
    title: String,
    issue_type: IssueType,
    status: Status,
    priority: u8,
    labels: Vec<String>,
}

impl Default for IssueBuilder {
    fn default() -> Self {
        Self {
            title: "test issue".into(),
            issue_type: IssueType::Task,
            status: Status::Open,
            priority: 3,
            labels: Vec::new(),
        }
    }
}

impl IssueBuilder {
    crate::setters! {
        into { title: String }
        set { issue_type: IssueType, status: Status, priority: u8, labels: Vec<String> }
    }

    pub fn build(self) -> Issue {
        Issue {
            id: IssueId::new(),
            title: self.title,
            description: None,
            design: None,
            acceptance_criteria: None,
            notes: None,
            issue_type: self.issue_type,
            status: self.status,
            priority: self.priority,
            assignee: None,
            created_at: 0,
            updated_at: 0,
            closed_at: if self.status.is_closed() { Some(0) } else { None },
            close_reason: None,
            closed_by_session: None,
            spec_id: None,
            external_ref: None,
            source_system: None,
            estimated_minutes: 0,
            pinned: false,
            is_template: false,
            ephemeral: false,
            quality_score: None,
            due_at: None,
            defer_until: None,
            content_hash: None,
            labels: self.labels,
            hook_command: None,
            hook_trigger: None,
            hook_timeout_secs: None,
            hook_on_failure: None,
            extra: serde_json::Map::new(),
        }
    }
}

impl Issue {
    pub fn builder() -> IssueBuilder {
        IssueBuilder::default()
    }
}
