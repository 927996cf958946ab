// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O: a Unix socket (trusted, no
//! auth) plus an optional TCP listener guarded by a `Hello{token}`
//! handshake and optional TLS (§4.1, §6.3).

use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls_pki_types::{CertificateDer, PrivateKeyDer};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, UnixListener};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use bd_storage::StorageAdapter;
use bd_wire::{read_request, write_response, Envelope, ProtocolError, Request, Response};

use crate::dispatch::dispatch;
use crate::flush::Debouncer;

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("tls error: {0}")]
    Tls(#[from] std::io::Error),
}

/// Shared context handed to every connection handler.
pub struct ListenCtx {
    pub adapter: Arc<dyn StorageAdapter>,
    pub flush: Arc<Debouncer>,
    /// When set, TCP clients must present this token in `Hello`.
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionSource {
    Unix,
    Tcp,
}

pub struct Listener {
    unix: UnixListener,
    tcp: Option<(TcpListener, Option<tokio_rustls::TlsAcceptor>)>,
    ctx: Arc<ListenCtx>,
}

impl Listener {
    pub fn new(unix: UnixListener, ctx: Arc<ListenCtx>) -> Self {
        Self { unix, tcp: None, ctx }
    }

    pub fn with_tcp(unix: UnixListener, tcp: TcpListener, tls: Option<tokio_rustls::TlsAcceptor>, ctx: Arc<ListenCtx>) -> Self {
        Self { unix, tcp: Some((tcp, tls)), ctx }
    }

    /// Accept connections until `shutdown` fires. New connections stop
    /// being accepted at that point; already-spawned handlers run to
    /// completion (§4.7 shutdown step 1).
    pub async fn run(self, shutdown: CancellationToken) {
        let Listener { unix, tcp, ctx } = self;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("listener stopping, no longer accepting connections");
                    return;
                }
                result = unix.accept() => {
                    match result {
                        Ok((stream, _)) => {
                            let ctx = Arc::clone(&ctx);
                            tokio::spawn(async move {
                                let (reader, writer) = stream.into_split();
                                if let Err(e) = handle_connection(reader, writer, ConnectionSource::Unix, &ctx).await {
                                    log_connection_error(e);
                                }
                            });
                        }
                        Err(e) => error!("unix accept error: {e}"),
                    }
                }
                result = accept_tcp(&tcp) => {
                    if let Some(Ok((stream, tls))) = result {
                        let ctx = Arc::clone(&ctx);
                        tokio::spawn(async move {
                            match tls {
                                Some(acceptor) => match acceptor.accept(stream).await {
                                    Ok(stream) => {
                                        let (reader, writer) = tokio::io::split(stream);
                                        if let Err(e) = handle_connection(reader, writer, ConnectionSource::Tcp, &ctx).await {
                                            log_connection_error(e);
                                        }
                                    }
                                    Err(e) => error!("tls handshake failed: {e}"),
                                },
                                None => {
                                    let (reader, writer) = stream.into_split();
                                    if let Err(e) = handle_connection(reader, writer, ConnectionSource::Tcp, &ctx).await {
                                        log_connection_error(e);
                                    }
                                }
                            }
                        });
                    }
                }
            }
        }
    }
}

async fn accept_tcp(
    tcp: &Option<(TcpListener, Option<tokio_rustls::TlsAcceptor>)>,
) -> Option<std::io::Result<(tokio::net::TcpStream, Option<tokio_rustls::TlsAcceptor>)>> {
    match tcp {
        Some((listener, acceptor)) => {
            let result = listener.accept().await;
            Some(result.map(|(stream, addr)| {
                debug!("tcp connection from {addr}");
                (stream, acceptor.clone())
            }))
        }
        None => std::future::pending().await,
    }
}

fn log_connection_error(e: ListenerError) {
    match e {
        ListenerError::Protocol(ProtocolError::Io(_)) => debug!("client disconnected"),
        other => error!("connection error: {other}"),
    }
}

/// Handle every request a client sends on one connection, in order,
/// until it disconnects. A TCP connection's first message must be
/// `Hello`; the Unix socket has no such gate (§4.1, §6.3).
async fn handle_connection<R, W>(mut reader: R, mut writer: W, source: ConnectionSource, ctx: &ListenCtx) -> Result<(), ListenerError>
where
    R: AsyncRead + AsyncReadExt + Unpin + Send,
    W: AsyncWrite + AsyncWriteExt + Unpin + Send,
{
    if source == ConnectionSource::Tcp {
        let envelope = match read_request(&mut reader).await {
            Ok(envelope) => envelope,
            Err(ProtocolError::Io(_)) => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        let Request::Hello { ref token } = envelope.body else {
            let response = Response::Error { code: "unauthorized".into(), message: "TCP connections must start with Hello".into() };
            let _ = write_response(&mut writer, &envelope.request_id, &response).await;
            return Ok(());
        };
        if let Some(expected) = &ctx.auth_token {
            if token != expected {
                let response = Response::Error { code: "unauthorized".into(), message: "invalid token".into() };
                let _ = write_response(&mut writer, &envelope.request_id, &response).await;
                return Ok(());
            }
        }
        let response = dispatch(&ctx.adapter, &ctx.flush, envelope.body).await;
        write_response(&mut writer, &envelope.request_id, &response).await?;
    }

    loop {
        if !handle_one_request(&mut reader, &mut writer, ctx).await? {
            return Ok(());
        }
    }
}

/// Read, dispatch, and respond to a single request. Returns `false`
/// when the client has disconnected cleanly, so the caller's loop
/// stops without treating that as an error.
///
/// Unlike a single-shot handler, this can't race a speculative read
/// against dispatch to detect an early disconnect: on a connection
/// that serves many requests in sequence, a stray read would steal
/// bytes belonging to the next request's frame.
async fn handle_one_request<R, W>(reader: &mut R, writer: &mut W, ctx: &ListenCtx) -> Result<bool, ListenerError>
where
    R: AsyncRead + AsyncReadExt + Unpin + Send,
    W: AsyncWrite + AsyncWriteExt + Unpin + Send,
{
    let envelope: Envelope<Request> = match read_request(reader).await {
        Ok(envelope) => envelope,
        Err(ProtocolError::Io(_)) => return Ok(false),
        Err(e) => return Err(e.into()),
    };

    let response = dispatch(&ctx.adapter, &ctx.flush, envelope.body).await;
    write_response(writer, &envelope.request_id, &response).await?;
    Ok(true)
}

/// Build a `TlsAcceptor` from a PEM cert chain and private key.
pub fn build_tls_acceptor(cert_path: &Path, key_path: &Path) -> std::io::Result<tokio_rustls::TlsAcceptor> {
    let certs = load_certs(cert_path)?;
    let key = load_key(key_path)?;
    let config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(std::io::Error::other)?;
    Ok(tokio_rustls::TlsAcceptor::from(Arc::new(config)))
}

fn load_certs(path: &Path) -> std::io::Result<Vec<CertificateDer<'static>>> {
    let file = std::fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::certs(&mut reader).collect::<Result<Vec<_>, _>>()
}

fn load_key(path: &Path) -> std::io::Result<PrivateKeyDer<'static>> {
    let file = std::fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::private_key(&mut reader)?.ok_or_else(|| std::io::Error::other("no private key found in file"))
}
