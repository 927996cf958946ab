// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Orchestration that sits above the pure algorithms in `bd-core` and
//! the storage surface in `bd-storage`: advice-hook dispatch at
//! lifecycle trigger points, and decision-point reminder scheduling.
//! Neither the Subscription Matcher (§4.6) nor the Decision Point
//! iteration rules (§3.3) live here — both are pure functions already
//! in `bd-core`; this crate is only the side-effecting glue around
//! them.

pub mod advice;
pub mod reminder;

pub use advice::{dispatch_hooks, HookRunReport};
pub use reminder::{due_for_reminder, remind_stale_decisions};
