// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timestamped record of a spec fingerprint change.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Scan event identifier.
    pub struct ScanEventId("scn-");
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanEvent {
    pub id: ScanEventId,
    pub spec_id: String,
    pub fingerprint: String,
    pub detected_at: u64,
}
