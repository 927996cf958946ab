// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot schema migration (§9 Open Question: single-version gate).
//!
//! Beads ships a single snapshot schema version today, so the registry
//! starts empty and `migrate_to` is a no-op for `current == target`.
//! The chain-walking machinery exists so a future schema bump has
//! somewhere to register a [`Migration`] rather than hand-rolling a
//! one-off upgrade path in the daemon.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MigrationError {
    #[error("snapshot version {0} is newer than supported version {1}")]
    TooNew(u32, u32),
    #[error("no migration path from version {0} to {1}")]
    NoPath(u32, u32),
}

pub trait Migration {
    fn source_version(&self) -> u32;
    fn target_version(&self) -> u32;
    fn migrate(&self, snapshot: &mut Value) -> Result<(), MigrationError>;
}

#[derive(Default)]
pub struct MigrationRegistry {
    migrations: Vec<Box<dyn Migration>>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self { migrations: Vec::new() }
    }

    pub fn migrate_to(&self, snapshot: Value, target: u32) -> Result<Value, MigrationError> {
        let current = snapshot.get("v").and_then(Value::as_u64).unwrap_or(1) as u32;
        if current == target {
            return Ok(snapshot);
        }
        if current > target {
            return Err(MigrationError::TooNew(current, target));
        }

        let mut v = current;
        let mut snap = snapshot;
        while v != target {
            let step = self
                .migrations
                .iter()
                .find(|m| m.source_version() == v)
                .ok_or(MigrationError::NoPath(current, target))?;
            step.migrate(&mut snap)?;
            snap["v"] = serde_json::json!(step.target_version());
            v = step.target_version();
        }
        Ok(snap)
    }
}

#[cfg(test)]
#[path = "migration_tests.rs"]
mod tests;
