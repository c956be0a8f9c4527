//! WebSocket server: accept loop and per-session task management.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Accepting incoming TCP connections from clients.
//! 3. Upgrading each connection to a WebSocket session.
//! 4. Handing every binary message to [`store_frame`] and logging the result.
//! 5. Stopping the accept loop when the `running` flag is cleared.
//!
//! Each session runs in its own Tokio task, so a slow writer never delays
//! other clients.  A frame that cannot be decoded or stored is logged and
//! the session carries on; only a Close frame or a socket error ends it.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
};
use tracing::{debug, error, info, warn};

use crate::application::store_frame;
use crate::domain::ServerConfig;

/// How often the accept loop re-checks the `running` flag.
const ACCEPT_POLL: Duration = Duration::from_millis(200);

// ── Public API ────────────────────────────────────────────────────────────────

/// Creates the output directory and binds the listener.
///
/// Split from [`serve`] so callers (and tests) can bind port 0 and read the
/// chosen address before serving.
///
/// # Errors
///
/// Returns an error if the output directory cannot be created or the
/// listener cannot be bound.
pub async fn bind(config: &ServerConfig) -> anyhow::Result<TcpListener> {
    tokio::fs::create_dir_all(&config.out_dir)
        .await
        .with_context(|| format!("failed to create output directory {}", config.out_dir.display()))?;

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {}", config.bind_addr))?;

    info!(
        "FileDrop hub listening on {}; writing files to {}",
        listener.local_addr().unwrap_or(config.bind_addr),
        config.out_dir.display()
    );
    Ok(listener)
}

/// Accepts sessions on `listener` until `running` is set to `false`.
pub async fn serve(listener: TcpListener, out_dir: PathBuf, running: Arc<AtomicBool>) {
    let out_dir = Arc::new(out_dir);

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        // Short timeout so the loop notices the flag even when nobody connects.
        match timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                info!("new connection from {peer_addr}");
                let out_dir = Arc::clone(&out_dir);
                tokio::spawn(async move {
                    handle_session(stream, peer_addr, &out_dir).await;
                });
            }
            Ok(Err(e)) => error!("accept error: {e}"),
            Err(_) => {}
        }
    }
}

/// Binds according to `config` and serves until `running` is cleared.
///
/// # Errors
///
/// Returns an error if [`bind`] fails.
pub async fn run_server(config: ServerConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    let listener = bind(&config).await?;
    serve(listener, config.out_dir, running).await;
    Ok(())
}

// ── Per-session handler ───────────────────────────────────────────────────────

async fn handle_session(raw_stream: TcpStream, peer_addr: SocketAddr, out_dir: &Path) {
    match run_session(raw_stream, peer_addr, out_dir).await {
        Ok(received) => info!("session {peer_addr} closed normally after {received} file(s)"),
        Err(e) => warn!("session {peer_addr} closed with error: {e:#}"),
    }
}

/// Runs one client session and returns the number of files stored.
///
/// # Errors
///
/// Returns an error if the WebSocket handshake fails.
async fn run_session(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    out_dir: &Path,
) -> anyhow::Result<usize> {
    let ws_stream = accept_async(raw_stream)
        .await
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;
    info!("WebSocket session established: {peer_addr}");

    let (mut ws_tx, mut ws_rx) = ws_stream.split();
    let mut received = 0usize;

    loop {
        let message = match ws_rx.next().await {
            Some(Ok(message)) => message,
            Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) => {
                debug!("session {peer_addr}: client closed the connection");
                break;
            }
            Some(Err(e)) => {
                warn!("session {peer_addr}: WebSocket error: {e}");
                break;
            }
            None => {
                debug!("session {peer_addr}: stream ended");
                break;
            }
        };

        match message {
            WsMessage::Binary(data) => match store_frame(out_dir, &data).await {
                Ok(stored) => {
                    received += 1;
                    info!(
                        "session {peer_addr}: stored {} ({} bytes, {})",
                        stored.path.display(),
                        stored.size,
                        if stored.header.mime_type.is_empty() {
                            "unknown type"
                        } else {
                            stored.header.mime_type.as_str()
                        }
                    );
                }
                // Don't close the session for one bad frame.
                Err(e) => warn!("session {peer_addr}: dropped message of {} bytes: {e}", data.len()),
            },
            WsMessage::Text(text) => debug!("session {peer_addr}: ignoring text message ({} bytes)", text.len()),
            WsMessage::Close(frame) => {
                debug!("session {peer_addr}: close frame {frame:?}");
                break;
            }
            // Pings are answered by tungstenite itself.
            _ => {}
        }
    }

    let _ = ws_tx.close().await;
    Ok(received)
}
