// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate (§6.4).

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Protocol version reported in the `Hello` handshake.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resolve the state directory: `BEADS_STATE_DIR` >
/// `XDG_STATE_HOME/beads` > `~/.local/state/beads`.
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("BEADS_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("beads"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/beads"))
}

/// Per-request client timeout.
pub fn ipc_timeout() -> Duration {
    std::env::var("BEADS_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Shutdown drain bound for `CancelAndWait`-ing the Flush Engine.
pub fn drain_timeout() -> Duration {
    std::env::var("BEADS_DRAIN_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Flush Engine quiet window (§4.5, default 5s).
pub fn flush_debounce() -> Duration {
    std::env::var("BEADS_FLUSH_DEBOUNCE")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// TCP listen address, if remote access is enabled.
pub fn tcp_addr() -> Option<String> {
    std::env::var("BD_DAEMON_TCP_ADDR").ok().filter(|s| !s.is_empty())
}

/// Bearer token required in the `Hello` handshake for TCP connections.
/// Absence disables remote access even if `BD_DAEMON_TCP_ADDR` is set.
pub fn auth_token() -> Option<String> {
    std::env::var("BD_DAEMON_TOKEN").ok().filter(|s| !s.is_empty())
}

/// TLS certificate/key paths for the TCP listener. A key without a cert
/// (or vice versa) is a start-time error (§6.3).
pub fn tls_cert_and_key() -> Result<Option<(PathBuf, PathBuf)>, LifecycleError> {
    let cert = std::env::var("BD_DAEMON_TLS_CERT").ok().filter(|s| !s.is_empty());
    let key = std::env::var("BD_DAEMON_TLS_KEY").ok().filter(|s| !s.is_empty());
    match (cert, key) {
        (Some(cert), Some(key)) => Ok(Some((PathBuf::from(cert), PathBuf::from(key)))),
        (None, None) => Ok(None),
        _ => Err(LifecycleError::IncompleteTlsConfig),
    }
}
