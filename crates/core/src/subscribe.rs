// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscription Matcher (§4.6): decides whether an Issue's label set
//! applies to a subscriber's subscription set.

use std::collections::HashSet;

use crate::label::parse_label_groups;

pub const GLOBAL_LABEL: &str = "global";

/// Hierarchical participant identity, `rig/role/name` (GLOSSARY).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentIdentity {
    pub rig: String,
    pub role: String,
    pub name: String,
}

/// Expand an identity into its base subscription set (§4.6):
/// `{global, rig:<rig>, role:<role>, agent:<rig>/<role>/<name>}`.
pub fn subscriptions_for_identity(identity: &AgentIdentity) -> HashSet<String> {
    let mut subs = HashSet::with_capacity(4);
    subs.insert(GLOBAL_LABEL.to_string());
    subs.insert(format!("rig:{}", identity.rig));
    subs.insert(format!("role:{}", identity.role));
    subs.insert(format!("agent:{}/{}/{}", identity.rig, identity.role, identity.name));
    subs
}

/// Decide whether an Issue whose labels are `labels` applies to a
/// subscriber whose expanded subscription set is `subs`.
///
/// O(|labels| + |subs|): group parsing is O(|labels|); each group/label
/// membership check against `subs` is O(1) via the hash set.
pub fn matches(labels: &[&str], subs: &HashSet<String>) -> bool {
    if labels.contains(&GLOBAL_LABEL) && subs.contains(GLOBAL_LABEL) {
        return true;
    }

    let groups = parse_label_groups(labels);
    let has_real_group = groups.iter().any(|g| g.group.is_some());

    if has_real_group {
        // Invariant 8: ALL members of a group must match; ANY group
        // matching suffices. An ungrouped bucket alongside real groups
        // does not itself count — §4.6 step 4 only falls back to the
        // ungrouped rule when there are no groups at all.
        groups
            .iter()
            .filter(|g| g.group.is_some())
            .any(|g| g.members.iter().all(|m| subs.contains(*m)))
    } else {
        groups.iter().any(|g| g.members.iter().any(|m| subs.contains(*m)))
    }
}
