// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use bd_core::{Comment, DecisionPoint, Dependency, DependentWithMetadata, Issue, ScanEvent, SpecRegistryEntry};
use serde::{Deserialize, Serialize};

/// Response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic success with no payload.
    Ok,

    /// TCP auth handshake accepted.
    Hello { version: String },

    Pong,

    Issue { issue: Box<Issue> },
    Issues { issues: Vec<Issue> },

    ResolvedId { id: String },

    Dependency { dependency: Box<Dependency> },
    Dependencies { dependencies: Vec<Issue> },
    DependentsWithMetadata { dependents: Vec<DependentWithMetadata> },

    Comment { comment: Box<Comment> },

    Decision { decision: Box<DecisionPoint> },
    Decisions { decisions: Vec<DecisionPoint> },

    Deleted { ids: Vec<String> },

    ScanEvent { event: Box<ScanEvent> },
    ScanEvents { events: Vec<ScanEvent> },
    SpecRegistryEntry { entry: Box<SpecRegistryEntry> },
    SpecRegistryEntries { entries: Vec<SpecRegistryEntry> },

    /// Error response, tagged with the stable textual code from §6.5.
    Error { code: String, message: String },
}

impl Response {
    pub fn from_error(err: &bd_core::CoreError) -> Self {
        Response::Error { code: err.tag().to_string(), message: err.to_string() }
    }
}
