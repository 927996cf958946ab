// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ID Resolver (§4.3): expands a partial/prefix identifier to a
//! canonical ID, in O(k + log n) via binary search over sorted IDs.

/// Maximum number of candidate IDs surfaced in an `Ambiguous` outcome.
pub const MAX_AMBIGUOUS_CANDIDATES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome<'a> {
    Unique(&'a str),
    Ambiguous(Vec<&'a str>),
    NotFound,
}

/// Resolve `token` against `sorted_ids`, which MUST already be sorted
/// ascending (the caller's canonical ID ordering — §3.2 invariant 4's
/// "sorted-by-ID" ordering is reused here). A token equal to a full
/// canonical ID resolves uniquely even if it is also a prefix of other
/// IDs (an exact match always wins).
pub fn resolve_id<'a>(token: &str, sorted_ids: &[&'a str]) -> ResolveOutcome<'a> {
    if token.is_empty() {
        return ResolveOutcome::NotFound;
    }

    if let Ok(idx) = sorted_ids.binary_search(&token) {
        return ResolveOutcome::Unique(sorted_ids[idx]);
    }

    // Binary search to the start of the prefix range, then scan only
    // while the prefix still matches — O(log n) to locate, O(k) to
    // collect the k matches.
    let start = sorted_ids.partition_point(|id| *id < token);
    let mut candidates = Vec::new();
    for &id in &sorted_ids[start..] {
        if id.starts_with(token) {
            candidates.push(id);
        } else {
            break;
        }
    }

    match candidates.len() {
        0 => ResolveOutcome::NotFound,
        1 => ResolveOutcome::Unique(candidates[0]),
        _ => ResolveOutcome::Ambiguous(candidates.into_iter().take(MAX_AMBIGUOUS_CANDIDATES).collect()),
    }
}
