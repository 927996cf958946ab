// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds shared across the workspace.
//!
//! Each variant maps to one of the seven error kinds and carries the
//! stable textual tag surfaced verbatim in RPC responses.

use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("ambiguous id {prefix:?}: {} candidates", candidates.len())]
    Ambiguous { prefix: String, candidates: Vec<String> },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("daemon locked by pid {pid}")]
    DaemonLocked { pid: u32 },

    #[error("shutting down")]
    ShuttingDown,

    #[error("unauthorized")]
    Unauthorized,

    #[error("transport: {0}")]
    Transport(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl CoreError {
    /// Stable textual tag surfaced in RPC responses (§6.5).
    pub fn tag(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "validation",
            CoreError::NotFound(_) => "not-found",
            CoreError::Ambiguous { .. } => "ambiguous",
            CoreError::Conflict(_) => "conflict",
            CoreError::DaemonLocked { .. } => "daemon-locked",
            CoreError::ShuttingDown => "shutting-down",
            CoreError::Unauthorized => "unauthorized",
            CoreError::Transport(_) => "transport",
            CoreError::Internal(_) => "internal",
        }
    }

    /// True for kinds the caller may retry after bounded backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Conflict(_))
    }
}
