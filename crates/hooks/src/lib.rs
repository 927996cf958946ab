// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Advice-issue hook execution: run one external command with a hard
//! timeout and capture its exit status and output (§3.1, §5).

use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::warn;

use bd_core::AdviceHookOnFailure;

#[derive(Debug, Error)]
pub enum HookError {
    #[error("failed to spawn hook command: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("hook command exceeded its {0}s timeout")]
    Timeout(u32),
}

#[derive(Debug, Clone)]
pub struct HookOutcome {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl HookOutcome {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Run `command` through `/bin/sh -c`, bounded by `timeout_secs`.
///
/// A timeout kills the child rather than leaving it orphaned: `Child`
/// is dropped inside the timed-out branch, which sends `SIGKILL` on
/// drop via `kill_on_drop`.
pub async fn run_hook(command: &str, timeout_secs: u32) -> Result<HookOutcome, HookError> {
    let mut child = Command::new("/bin/sh")
        .arg("-c")
        .arg(command)
        .kill_on_drop(true)
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .map_err(HookError::Spawn)?;

    let wait = child.wait_with_output();
    match tokio::time::timeout(Duration::from_secs(timeout_secs as u64), wait).await {
        Ok(Ok(output)) => Ok(HookOutcome {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }),
        Ok(Err(e)) => Err(HookError::Spawn(e)),
        Err(_) => Err(HookError::Timeout(timeout_secs)),
    }
}

/// Apply an advice issue's `hook_on_failure` policy to a hook result.
/// `Block` surfaces the error to the caller; `Warn` logs and proceeds;
/// `Ignore` proceeds silently.
pub fn apply_failure_policy(
    issue_id: &str,
    result: &Result<HookOutcome, HookError>,
    policy: AdviceHookOnFailure,
) -> Result<(), HookError> {
    let failed = match result {
        Ok(outcome) => !outcome.succeeded(),
        Err(_) => true,
    };
    if !failed {
        return Ok(());
    }
    match policy {
        AdviceHookOnFailure::Block => match result {
            Err(e) => Err(HookError::Spawn(std::io::Error::other(e.to_string()))),
            Ok(_) => Err(HookError::Spawn(std::io::Error::other("hook command failed"))),
        },
        AdviceHookOnFailure::Warn => {
            warn!(issue_id, "advice hook failed, proceeding per on_failure=warn");
            Ok(())
        }
        AdviceHookOnFailure::Ignore => Ok(()),
    }
}
