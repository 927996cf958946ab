// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot persistence for crash recovery.
//!
//! Snapshots store the complete materialized state at a point in time,
//! identified by the WAL sequence number. Recovery loads the snapshot
//! and replays WAL entries after that sequence. Snapshots are
//! zstd-compressed so a large store checkpoints and reloads quickly.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backup::rotate_bak_path;
use crate::migration::{MigrationError, MigrationRegistry};
use crate::state::MaterializedState;

pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("compression error: {0}")]
    Compression(std::io::Error),
    #[error("migration error: {0}")]
    Migration(#[from] MigrationError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "v")]
    pub version: u32,
    pub seq: u64,
    pub state: MaterializedState,
    pub created_at: DateTime<Utc>,
}

pub struct CheckpointResult {
    pub seq: u64,
    pub size_bytes: u64,
}

pub struct Checkpointer {
    path: PathBuf,
}

impl Checkpointer {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Write a compressed snapshot synchronously, rotating any
    /// existing snapshot file to `.bak` first.
    pub fn checkpoint_sync(&self, seq: u64, state: &MaterializedState) -> Result<CheckpointResult, SnapshotError> {
        let snapshot = Snapshot { version: CURRENT_SNAPSHOT_VERSION, seq, state: state.clone(), created_at: Utc::now() };
        let json = serde_json::to_vec(&snapshot)?;
        let compressed = zstd::encode_all(json.as_slice(), 3).map_err(SnapshotError::Compression)?;

        if self.path.exists() {
            let bak = rotate_bak_path(&self.path);
            fs::rename(&self.path, &bak).or_else(|_| fs::copy(&self.path, &bak).map(|_| ()))?;
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, &compressed)?;

        Ok(CheckpointResult { seq, size_bytes: compressed.len() as u64 })
    }

    /// Load the snapshot at `path`, migrating it to
    /// [`CURRENT_SNAPSHOT_VERSION`] if it was written by an older
    /// version. Returns `None` if no snapshot file exists yet.
    pub fn load(&self) -> Result<Option<Snapshot>, SnapshotError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.path)?;
        let json = zstd::decode_all(bytes.as_slice()).map_err(SnapshotError::Compression)?;
        let value: serde_json::Value = serde_json::from_slice(&json)?;
        let migrated = MigrationRegistry::new().migrate_to(value, CURRENT_SNAPSHOT_VERSION)?;
        Ok(Some(serde_json::from_value(migrated)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trips_through_compression() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshot.zst");
        let checkpointer = Checkpointer::new(path);
        let state = MaterializedState::default();

        let result = checkpointer.checkpoint_sync(42, &state).unwrap();
        assert_eq!(result.seq, 42);
        assert!(result.size_bytes > 0);

        let loaded = checkpointer.load().unwrap().unwrap();
        assert_eq!(loaded.seq, 42);
        assert_eq!(loaded.version, CURRENT_SNAPSHOT_VERSION);
    }

    #[test]
    fn missing_snapshot_is_none() {
        let dir = tempdir().unwrap();
        let checkpointer = Checkpointer::new(dir.path().join("missing.zst"));
        assert!(checkpointer.load().unwrap().is_none());
    }

    #[test]
    fn rotates_previous_snapshot_to_bak() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshot.zst");
        let checkpointer = Checkpointer::new(path.clone());
        let state = MaterializedState::default();

        checkpointer.checkpoint_sync(1, &state).unwrap();
        checkpointer.checkpoint_sync(2, &state).unwrap();

        assert!(path.with_extension("bak").exists());
        assert_eq!(checkpointer.load().unwrap().unwrap().seq, 2);
    }
}
