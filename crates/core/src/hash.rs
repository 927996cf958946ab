// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic content hashing (§3.2 invariant 4, §4.4, §8).
//!
//! The hash of a set of Issues is a function of the issues' canonical
//! serialized form and nothing else: not mtime, not insertion order.

use sha2::{Digest, Sha256};

use crate::issue::Issue;

/// Canonical per-issue serialization used as hash input: a
/// `serde_json` object with keys in a fixed order (struct field
/// declaration order, which `serde_json::to_string` preserves for
/// structs regardless of any `HashMap`/`BTreeMap` the caller built the
/// set from).
fn canonical_line(issue: &Issue) -> String {
    // `serde_json::to_string` never fails for `Issue` (no non-finite
    // floats feed into it other than `quality_score`, and `to_string`
    // round-trips NaN/inf as null without erroring in serde_json).
    serde_json::to_string(issue).unwrap_or_default()
}

/// Content hash over a sorted-by-ID export of `issues` (§3.2 invariant
/// 4). Callers MUST pass issues already sorted by `id` — this function
/// does not sort, so that it has no allocation-order dependency of its
/// own; `content_hash_unsorted` is provided for callers that want the
/// sort performed for them.
pub fn content_hash<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> String {
    let mut hasher = Sha256::new();
    for issue in issues {
        hasher.update(canonical_line(issue).as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

/// Convenience wrapper that sorts a copy of `issues` by ID before
/// hashing, so callers don't need to pre-sort (invariant 4: "Order of
/// insertion into the store MUST NOT change the snapshot hash").
pub fn content_hash_unsorted(issues: &[Issue]) -> String {
    let mut sorted: Vec<&Issue> = issues.iter().collect();
    sorted.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
    content_hash(sorted)
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        let bytes = bytes.as_ref();
        let mut s = String::with_capacity(bytes.len() * 2);
        for b in bytes {
            s.push_str(&format!("{b:02x}"));
        }
        s
    }
}
