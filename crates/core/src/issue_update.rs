// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed partial update for an Issue's mutable fields, shared by the
//! storage event log and the wire protocol's `Update` request.

use serde::{Deserialize, Serialize};

use crate::issue::IssueType;

/// `None` leaves a field unchanged; fields that are themselves optional
/// on [`crate::Issue`] use `Option<Option<T>>` so that "clear this
/// field" can be expressed distinctly from "leave it alone".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IssueUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub design: Option<Option<String>>,
    pub acceptance_criteria: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub issue_type: Option<IssueType>,
    pub priority: Option<u8>,
    pub assignee: Option<Option<String>>,
    pub spec_id: Option<Option<String>>,
    pub external_ref: Option<Option<String>>,
    pub source_system: Option<Option<String>>,
    pub estimated_minutes: Option<u32>,
    pub pinned: Option<bool>,
    pub quality_score: Option<Option<f32>>,
    pub due_at: Option<Option<u64>>,
    pub defer_until: Option<Option<u64>>,
    #[serde(default)]
    pub updated_at: u64,
}
