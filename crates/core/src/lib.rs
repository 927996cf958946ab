// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bd-core: entity types, IDs, clock, error kinds, and the pure
//! algorithms (ID resolution, subscription matching, content hashing)
//! shared by the storage, wire, and daemon crates.

pub mod macros;

pub mod clock;
pub mod comment;
pub mod decision;
pub mod dependency;
pub mod error;
pub mod hash;
pub mod id;
pub mod issue;
pub mod issue_update;
pub mod label;
pub mod molecule;
pub mod resolve;
pub mod scan_event;
pub mod spec_registry;
pub mod subscribe;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use comment::{Comment, CommentId};
pub use decision::{DecisionId, DecisionOption, DecisionPoint};
pub use dependency::{Dependency, DependencyId, DependencyType, DependentWithMetadata};
pub use error::{CoreError, CoreResult};
pub use hash::content_hash;
pub use id::short;
pub use issue::{AdviceHookOnFailure, AdviceHookTrigger, Issue, IssueId, IssueType, Status};
pub use issue_update::IssueUpdate;
pub use label::{parse_label_groups, LabelGroup};
pub use molecule::{pour_molecule, PourError};
pub use resolve::{resolve_id, ResolveOutcome};
pub use scan_event::{ScanEvent, ScanEventId};
pub use spec_registry::{SpecRegistryEntry, SpecRegistryId, SpecRegistryState};
pub use subscribe::{matches as subscription_matches, subscriptions_for_identity, AgentIdentity};
