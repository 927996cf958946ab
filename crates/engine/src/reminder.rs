// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Decision-point reminder scanning: bump `reminder_count` on open
//! Decision Points that have gone stale without a response, leaving
//! `iteration` untouched (§9 Open Question resolution).

use std::sync::Arc;
use std::time::Duration;

use bd_core::DecisionPoint;
use bd_storage::StorageAdapter;

/// True when `decision` is unresolved and has been waiting at least
/// `staleness` since it was created (or since its last reminder, for
/// callers that track that separately — this function only looks at
/// `created_at` since the event log doesn't currently record a
/// per-reminder timestamp).
pub fn due_for_reminder(decision: &DecisionPoint, now_ms: u64, staleness: Duration) -> bool {
    if decision.is_resolved() {
        return false;
    }
    let age_ms = now_ms.saturating_sub(decision.created_at);
    age_ms >= staleness.as_millis() as u64
}

/// Scan every decision via `adapter` and bump the reminder count on
/// each one that's due. Returns the IDs reminded.
pub async fn remind_stale_decisions(
    adapter: &Arc<dyn StorageAdapter>,
    now_ms: u64,
    staleness: Duration,
) -> bd_core::CoreResult<Vec<String>> {
    let decisions = adapter.list_decisions().await?;
    let mut reminded = Vec::new();
    for decision in decisions {
        if due_for_reminder(&decision, now_ms, staleness) {
            adapter.remind_decision(decision.id.as_str()).await?;
            reminded.push(decision.id.as_str().to_string());
        }
    }
    Ok(reminded)
}
