// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Decision Point: attached to a "gate" Issue, carries the prompt and
//! options an external responder (human or agent) resolves.

use serde::{Deserialize, Serialize};

use crate::issue::IssueId;

crate::define_id! {
    /// Decision point identifier.
    pub struct DecisionId("dcn-");
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionOption {
    pub id: String,
    pub short: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionPoint {
    pub id: DecisionId,
    pub issue_id: IssueId,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub options: Vec<DecisionOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_option: Option<String>,
    pub iteration: u32,
    pub max_iterations: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_iteration_id: Option<DecisionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance: Option<String>,
    pub requested_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responded_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_option: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_text: Option<String>,
    /// Monotonically increasing, independent of `iteration` (Open
    /// Question resolution, SPEC_FULL.md §9).
    #[serde(default)]
    pub reminder_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,
    pub created_at: u64,
}

impl DecisionPoint {
    pub fn is_resolved(&self) -> bool {
        self.selected_option.is_some()
    }

    /// True when a response supplies guidance but no selected option —
    /// the iteration should advance rather than resolve (§3.3).
    pub fn should_iterate(&self) -> bool {
        !self.is_resolved() && self.guidance.is_some() && self.iteration < self.max_iterations
    }

    pub fn bump_reminder(&mut self) {
        self.reminder_count += 1;
    }
}
