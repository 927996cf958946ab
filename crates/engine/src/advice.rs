// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Advice-hook dispatch: at a lifecycle trigger point (session-end,
//! before-commit, before-push, before-handoff) find every open advice
//! Issue subscribed to the calling agent's identity and run its hook
//! command (§3.1, §5).

use std::sync::Arc;

use bd_core::{AdviceHookTrigger, AgentIdentity};
use bd_hooks::{apply_failure_policy, run_hook};
use bd_storage::StorageAdapter;

#[derive(Debug, Clone)]
pub struct HookRunReport {
    pub issue_id: String,
    pub succeeded: bool,
    pub error: Option<String>,
}

/// Default hook timeout when an advice issue doesn't set one,
/// bounded by `HOOK_TIMEOUT_MAX_SECS`.
const DEFAULT_HOOK_TIMEOUT_SECS: u32 = 30;

/// Run every open advice issue's hook command for `trigger` that
/// applies to `identity` per the Subscription Matcher, in listing
/// order. A `Block` policy failure stops dispatch at the first such
/// failure and its error is the last report entry's `error`; `Warn`/
/// `Ignore` failures are recorded but do not halt dispatch.
pub async fn dispatch_hooks(
    adapter: &Arc<dyn StorageAdapter>,
    trigger: AdviceHookTrigger,
    identity: &AgentIdentity,
) -> bd_core::CoreResult<Vec<HookRunReport>> {
    let subs = bd_core::subscriptions_for_identity(identity);
    let issues = adapter.list_issues().await?;

    let mut reports = Vec::new();
    for issue in issues {
        if issue.issue_type != bd_core::IssueType::Advice || issue.status.is_closed() {
            continue;
        }
        if issue.hook_trigger != Some(trigger) {
            continue;
        }
        let Some(command) = issue.hook_command.as_deref() else { continue };

        let labels: Vec<&str> = issue.labels.iter().map(String::as_str).collect();
        if !bd_core::subscription_matches(&labels, &subs) {
            continue;
        }

        let timeout = issue.hook_timeout_secs.unwrap_or(DEFAULT_HOOK_TIMEOUT_SECS);
        let result = run_hook(command, timeout).await;
        let policy = issue.hook_on_failure.unwrap_or(bd_core::AdviceHookOnFailure::Warn);
        let succeeded = matches!(&result, Ok(outcome) if outcome.succeeded());
        let hook_error = match &result {
            Ok(outcome) if !outcome.succeeded() => Some(format!("hook exited non-zero: {}", outcome.stderr.trim())),
            Err(e) => Some(e.to_string()),
            Ok(_) => None,
        };
        let blocked = apply_failure_policy(issue.id.as_str(), &result, policy).is_err();

        reports.push(HookRunReport { issue_id: issue.id.as_str().to_string(), succeeded, error: hook_error });
        if blocked {
            break;
        }
    }
    Ok(reports)
}
