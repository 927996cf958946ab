// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event-sourced persistence for a beads store: a write-ahead log of
//! [`Event`]s, a [`MaterializedState`] derived by replaying it, and a
//! zstd-compressed [`Checkpointer`] snapshot so recovery doesn't replay
//! the log from the beginning of time.
//!
//! This crate intentionally has no embedded SQL engine or transaction
//! log: the WAL itself is the durability mechanism, and
//! [`MaterializedState::apply_event`] is the only place domain
//! semantics live.

mod backup;

pub mod adapter;
pub mod change_detector;
pub mod checkpoint;
pub mod event;
pub mod export;
pub mod migration;
pub mod state;
pub mod store;
pub mod wal;

pub use adapter::{EventSourcedAdapter, StorageAdapter};
pub use change_detector::{
    check_import, conflicts, diff, hex_sha256, quick_check, validate_pre_export, ChangeSet, Conflict, DetectorError,
    ImportMetadata, ImportStatus,
};
pub use export::{read_snapshot, write_snapshot};
pub use checkpoint::{CheckpointResult, Checkpointer, Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
pub use event::Event;
pub use migration::{Migration, MigrationError, MigrationRegistry};
pub use state::MaterializedState;
pub use store::{EventSourcedStore, RecoveryReport, StorageError};
pub use wal::{Wal, WalEntry, WalError};
