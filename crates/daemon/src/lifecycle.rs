// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: lock acquisition, startup, shutdown
//! (§4.7).

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use bd_core::SystemClock;
use bd_storage::{EventSourcedAdapter, EventSourcedStore, StorageAdapter, StorageError};

use crate::env;
use crate::flush::Debouncer;

/// Daemon configuration: every path the lifecycle touches, resolved
/// once at startup (grounded on the teacher's `lifecycle::Config::load`).
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub lock_path: PathBuf,
    /// Legacy PID-only file for backward-compat observers (§3.3).
    pub legacy_pid_path: PathBuf,
    pub wal_path: PathBuf,
    pub snapshot_path: PathBuf,
    /// Canonical line-delimited JSON export the Change Detector watches
    /// for hand-edits (§6.1, §6.2).
    pub export_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = env::state_dir()?;
        Ok(Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.lock"),
            legacy_pid_path: state_dir.join("daemon.pid"),
            wal_path: state_dir.join("wal").join("events.wal"),
            snapshot_path: state_dir.join("snapshot.json"),
            export_path: state_dir.join("issues.jsonl"),
            state_dir,
        })
    }
}

/// JSON payload written to `daemon.lock` while the daemon is running
/// (§4.7, §6.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockPayload {
    pub pid: u32,
    pub database_path: PathBuf,
    pub version: String,
    pub started_at: u64,
}

/// Result of `try_daemon_lock`: whether a daemon appears to be running
/// and, if so, its PID.
pub fn try_daemon_lock(lock_path: &std::path::Path) -> (bool, Option<u32>) {
    let Ok(file) = std::fs::File::open(lock_path) else { return (false, None) };
    match file.try_lock_shared() {
        Ok(()) => {
            let _ = fs2::FileExt::unlock(&file);
            (false, None)
        }
        Err(_) => {
            let pid = std::fs::read_to_string(lock_path)
                .ok()
                .and_then(|s| serde_json::from_str::<LockPayload>(&s).ok())
                .map(|p| p.pid);
            (true, pid)
        }
    }
}

pub struct DaemonState {
    pub config: Config,
    #[allow(dead_code)]
    lock_file: File,
    pub store: Arc<EventSourcedStore<SystemClock>>,
    pub adapter: Arc<dyn StorageAdapter>,
    pub flush: Arc<Debouncer>,
    pub start_time: Instant,
}

pub struct StartupResult {
    pub daemon: DaemonState,
    pub listener: UnixListener,
}

impl std::fmt::Debug for DaemonState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DaemonState").finish_non_exhaustive()
    }
}

impl std::fmt::Debug for StartupResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartupResult").finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine state directory")]
    NoStateDir,
    #[error("daemon already running (pid {pid})")]
    DaemonLocked { pid: u32 },
    #[error("lock file's recorded database path {recorded:?} does not match {expected:?}")]
    DatabasePathMismatch { recorded: PathBuf, expected: PathBuf },
    #[error("failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("BD_DAEMON_TLS_CERT and BD_DAEMON_TLS_KEY must both be set or both unset")]
    IncompleteTlsConfig,
}

/// Acquire the daemon lock, replay/load storage, and bind the Unix
/// socket (steps 1-5 of §4.7's Acquisition, adapted: the JSON lock
/// payload plus a `daemon.pid` backward-compat twin are both written
/// only after the exclusive lock succeeds; the socket is bound last).
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            if !matches!(e, LifecycleError::DaemonLocked { .. }) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;
    if let Some(parent) = config.wal_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let lock_file = std::fs::OpenOptions::new().write(true).create(true).truncate(false).open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(|_| {
        let (_, pid) = try_daemon_lock(&config.lock_path);
        LifecycleError::DaemonLocked { pid: pid.unwrap_or(0) }
    })?;

    if let Some(existing) = std::fs::read_to_string(&config.lock_path).ok().filter(|s| !s.is_empty()) {
        if let Ok(payload) = serde_json::from_str::<LockPayload>(&existing) {
            if payload.database_path != config.snapshot_path {
                return Err(LifecycleError::DatabasePathMismatch {
                    recorded: payload.database_path,
                    expected: config.snapshot_path.clone(),
                });
            }
        }
    }

    let started_at = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_secs();
    let payload = LockPayload {
        pid: std::process::id(),
        database_path: config.snapshot_path.clone(),
        version: env::PROTOCOL_VERSION.to_string(),
        started_at,
    };
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", serde_json::to_string(&payload).unwrap_or_default())?;
    let lock_file = lock_file;

    std::fs::write(&config.legacy_pid_path, std::process::id().to_string())?;

    let (store, recovery) =
        EventSourcedStore::<SystemClock>::open(&config.wal_path, Some(config.snapshot_path.clone()), SystemClock)?;
    info!(
        snapshot_seq = recovery.snapshot_seq,
        replayed_events = recovery.replayed_events,
        "recovered state from snapshot and WAL"
    );
    let store = Arc::new(store);
    let adapter: Arc<dyn StorageAdapter> = Arc::new(EventSourcedAdapter::new(Arc::clone(&store)));

    if let Err(e) = store.reconcile_external_snapshot(&config.export_path).await {
        warn!("failed to reconcile external export at startup: {e}");
    }

    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener =
        UnixListener::bind(&config.socket_path).map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    let flush_store = Arc::clone(&store);
    let export_path = config.export_path.clone();
    let flush = Arc::new(Debouncer::new(env::flush_debounce(), move || {
        let store = Arc::clone(&flush_store);
        let export_path = export_path.clone();
        Box::pin(async move {
            store.checkpoint().await.map(|_| ()).map_err(|e| e.to_string())?;
            store.export_snapshot(&export_path).await.map_err(|e| e.to_string())
        })
    }));

    info!("daemon started");

    Ok(StartupResult { daemon: DaemonState { config: config.clone(), lock_file, store, adapter, flush, start_time: Instant::now() }, listener })
}

/// Shutdown steps 2-4 of §4.7 (step 1, "stop accepting new
/// connections", is the caller's responsibility: drop the listener
/// before calling this).
impl DaemonState {
    pub async fn shutdown(self) -> Result<(), LifecycleError> {
        info!("shutting down daemon");
        self.flush.cancel_and_wait().await;

        if let Err(e) = self.store.checkpoint().await {
            warn!("failed to save shutdown snapshot: {e}");
        }
        if let Err(e) = self.store.export_snapshot(&self.config.export_path).await {
            warn!("failed to export shutdown snapshot: {e}");
        }

        if self.config.socket_path.exists() {
            let _ = std::fs::remove_file(&self.config.socket_path);
        }
        if self.config.lock_path.exists() {
            let _ = std::fs::remove_file(&self.config.lock_path);
        }
        if self.config.legacy_pid_path.exists() {
            let _ = std::fs::remove_file(&self.config.legacy_pid_path);
        }

        info!("daemon shutdown complete");
        Ok(())
    }
}

fn cleanup_on_failure(config: &Config) {
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }
    if config.legacy_pid_path.exists() {
        let _ = std::fs::remove_file(&config.legacy_pid_path);
    }
}
