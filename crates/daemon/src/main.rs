// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! beadsd: the background process that owns the work-tracking store.
//!
//! Listens on a Unix socket (and, optionally, TCP) for RPC requests,
//! dispatches them against the event-sourced store, and flushes
//! mutations to a snapshot on a debounced schedule.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod dispatch;
mod env;
mod flush;
mod lifecycle;
mod listener;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::lifecycle::{Config, LifecycleError, StartupResult};
use crate::listener::{build_tls_acceptor, ListenCtx, Listener};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("beadsd {}", env::PROTOCOL_VERSION);
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("beadsd {}", env::PROTOCOL_VERSION);
                println!("beads daemon - background process that owns the work-tracking store");
                println!();
                println!("beadsd is typically started by the `bd` CLI and should not be");
                println!("invoked directly. It listens on a Unix socket for commands from `bd`.");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: beadsd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    setup_logging();

    let config = Config::load()?;

    let StartupResult { daemon, listener: unix_listener } = match lifecycle::startup(&config).await {
        Ok(r) => r,
        Err(LifecycleError::DaemonLocked { pid }) => {
            eprintln!("beadsd is already running (pid {pid})");
            std::process::exit(1);
        }
        Err(e) => {
            error!("failed to start daemon: {e}");
            return Err(e.into());
        }
    };

    let ctx = Arc::new(ListenCtx {
        adapter: Arc::clone(&daemon.adapter),
        flush: Arc::clone(&daemon.flush),
        auth_token: env::auth_token(),
    });

    let tcp_listener = match env::tcp_addr() {
        Some(addr) => {
            let socket_addr: SocketAddr = addr.parse()?;
            Some(TcpListener::bind(socket_addr).await?)
        }
        None => None,
    };

    let tls_acceptor = match env::tls_cert_and_key()? {
        Some((cert, key)) => Some(build_tls_acceptor(&cert, &key)?),
        None => None,
    };

    let listener = match tcp_listener {
        Some(tcp) => Listener::with_tcp(unix_listener, tcp, tls_acceptor, ctx),
        None => Listener::new(unix_listener, ctx),
    };

    let shutdown = CancellationToken::new();
    let listener_shutdown = shutdown.clone();
    let listener_task = tokio::spawn(listener.run(listener_shutdown));

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(socket = %daemon.config.socket_path.display(), "daemon ready");
    println!("READY");

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }

    shutdown.cancel();
    let _ = listener_task.await;
    daemon.shutdown().await?;
    info!("daemon stopped");
    Ok(())
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
}
