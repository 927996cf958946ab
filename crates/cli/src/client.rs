// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client: a thin Unix-socket wrapper around `bd-wire`'s framing
//! (grounded on the teacher's `client::DaemonClient::send`, minus the
//! auto-start/version-check/retry machinery a full CLI would carry).

use std::path::PathBuf;
use std::time::Duration;

use bd_wire::{new_request_id, read_message, write_message, Envelope, ProtocolError, Request, Response};
use thiserror::Error;
use tokio::net::UnixStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon not running (no socket at {0})")]
    DaemonNotRunning(PathBuf),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("request timed out")]
    Timeout,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("response request_id {got} did not match request {expected}")]
    RequestIdMismatch { expected: String, got: String },
}

pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    pub fn connect(socket_path: PathBuf) -> Result<Self, ClientError> {
        if !socket_path.exists() {
            return Err(ClientError::DaemonNotRunning(socket_path));
        }
        Ok(Self { socket_path })
    }

    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();
        let timeout = ipc_timeout();

        let request_id = new_request_id();
        let envelope = Envelope::new(request_id.clone(), request);
        let data = bd_wire::encode(&envelope)?;
        tokio::time::timeout(timeout, write_message(&mut writer, &data)).await.map_err(|_| ClientError::Timeout)??;

        let response_bytes = tokio::time::timeout(timeout, read_message(&mut reader)).await.map_err(|_| ClientError::Timeout)??;
        let envelope: Envelope<Response> = bd_wire::decode(&response_bytes)?;
        if envelope.request_id != request_id {
            return Err(ClientError::RequestIdMismatch { expected: request_id, got: envelope.request_id });
        }
        Ok(envelope.body)
    }
}

fn ipc_timeout() -> Duration {
    std::env::var("BEADS_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Resolve the daemon's Unix socket path the same way `beadsd` does
/// (`BEADS_STATE_DIR` > `XDG_STATE_HOME/beads` > `~/.local/state/beads`).
pub fn socket_path() -> Result<PathBuf, ClientError> {
    let state_dir = if let Ok(dir) = std::env::var("BEADS_STATE_DIR") {
        PathBuf::from(dir)
    } else if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        PathBuf::from(xdg).join("beads")
    } else {
        let home = dirs::home_dir().ok_or_else(|| ClientError::Io(std::io::Error::other("could not determine home directory")))?;
        home.join(".local/state/beads")
    };
    Ok(state_dir.join("daemon.sock"))
}
