// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Free-text notes attached to an Issue.

use serde::{Deserialize, Serialize};

use crate::issue::IssueId;

crate::define_id! {
    /// Comment identifier.
    pub struct CommentId("cmt-");
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub issue_id: IssueId,
    pub author: String,
    pub body: String,
    pub created_at: u64,
}
