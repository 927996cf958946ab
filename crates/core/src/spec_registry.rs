// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracks the last-seen fingerprint and lifecycle state of a spec file.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Spec registry entry identifier.
    pub struct SpecRegistryId("spe-");
}

crate::simple_display! {
    SpecRegistryState {
        Active => "active",
        Done => "done",
        Archived => "archived",
        Missing => "missing",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecRegistryState {
    Active,
    Done,
    Archived,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecRegistryEntry {
    pub id: SpecRegistryId,
    pub spec_id: String,
    pub fingerprint: String,
    pub state: SpecRegistryState,
    pub created_at: u64,
    pub updated_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_at: Option<u64>,
}
