//! Self-healing WebSocket transport to the receiving hub.
//!
//! Architecture:
//! - One background task owns the connection loop: connect, run the session
//!   until the socket closes, record the close, sleep, repeat.
//! - The active socket is represented by the sender half of an `mpsc`
//!   channel feeding the socket's write half.  It is swapped in on every
//!   successful connect and cleared when the session ends, so [`TransportClient::send`]
//!   always targets the current socket, never a stale one.
//! - Every connection attempt that ends, whether it failed to connect or was
//!   closed later, counts as a close.  The delay before the next attempt comes
//!   from [`CloseHistory`]: 600 ms per close in the last five minutes, capped
//!   at five minutes.
//!
//! ```text
//! Connecting ──ok──> Open ──socket closed──┐
//!     ▲   └──connect failed────────────────┤
//!     │                                    ▼
//!     └──────── sleep(retry_in) ──── Closed { retry_in }
//! ```
//!
//! Inbound messages are logged and otherwise ignored; the hub never replies.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use filedrop_core::{BackoffPolicy, CloseHistory, EncodedFrame, Event, EventRegistry};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

/// Errors returned by [`TransportClient::send`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// No connection is currently open; the frame was not queued.
    #[error("transport is not connected")]
    NotOpen,
}

/// Configuration for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// WebSocket URL of the receiving hub (`ws://` or `wss://`).
    pub url: String,
    /// Reconnect backoff parameters.
    pub backoff: BackoffPolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            url: crate::infrastructure::storage::config::DEFAULT_HUB_URL.to_string(),
            backoff: BackoffPolicy::default(),
        }
    }
}

/// Connection state of the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// A connection attempt is in progress.
    Connecting,
    /// The socket is open and frames can be sent.
    Open,
    /// The last connection closed; the next attempt starts after `retry_in`.
    Closed { retry_in: Duration },
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "Connecting"),
            Self::Open => write!(f, "Connected"),
            Self::Closed { retry_in } => write!(f, "Disconnected, retrying in {retry_in:?}"),
        }
    }
}

/// Events published by the [`TransportClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    StatusChanged(ConnectionStatus),
}

/// Subscription keys for [`TransportEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportEventKind {
    StatusChanged,
}

impl Event for TransportEvent {
    type Kind = TransportEventKind;

    fn kind(&self) -> TransportEventKind {
        match self {
            Self::StatusChanged(_) => TransportEventKind::StatusChanged,
        }
    }
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct TransportInner {
    config: TransportConfig,
    events: EventRegistry<TransportEvent>,
    /// Outbound queue of the currently open socket, if any.
    socket: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    status: watch::Sender<ConnectionStatus>,
    /// Frames handed to a socket but not yet written to it.
    in_flight: watch::Sender<usize>,
}

/// WebSocket client that keeps itself connected to the hub.
///
/// Cloning yields another handle to the same connection.
#[derive(Clone)]
pub struct TransportClient {
    inner: Arc<TransportInner>,
}

impl TransportClient {
    /// Creates a transport that has not started connecting yet.
    ///
    /// Subscribe to status events first, then call [`start`](Self::start).
    pub fn new(config: TransportConfig) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Connecting);
        let (in_flight, _) = watch::channel(0);
        Self {
            inner: Arc::new(TransportInner {
                config,
                events: EventRegistry::new(),
                socket: Mutex::new(None),
                status,
                in_flight,
            }),
        }
    }

    /// Registers `handler` for events of `kind`.
    pub fn subscribe<F>(&self, kind: TransportEventKind, handler: F)
    where
        F: Fn(&TransportEvent) + Send + Sync + 'static,
    {
        self.inner.events.subscribe(kind, handler);
    }

    /// Spawns the connection loop.
    ///
    /// The loop reconnects until `running` is cleared; a session that is
    /// open when the flag is cleared runs until its socket closes.
    pub fn start(&self, running: Arc<AtomicBool>) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.connection_loop(running).await })
    }

    /// Queues `frame` on the currently open socket.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::NotOpen`] when no socket is open.  Nothing
    /// is buffered for a later connection.
    pub fn send(&self, frame: &EncodedFrame) -> Result<(), TransportError> {
        let socket = self.inner.lock_socket();
        let tx = socket.as_ref().ok_or(TransportError::NotOpen)?;
        // Counted before queueing so the writer can never decrement first.
        self.inner.in_flight.send_modify(|n| *n += 1);
        if tx.send(Message::Binary(frame.as_bytes().to_vec())).is_err() {
            self.inner.in_flight.send_modify(|n| *n = n.saturating_sub(1));
            return Err(TransportError::NotOpen);
        }
        debug!("queued frame of {} bytes", frame.len());
        Ok(())
    }

    /// Current connection state.
    pub fn status(&self) -> ConnectionStatus {
        *self.inner.status.borrow()
    }

    pub fn is_open(&self) -> bool {
        self.status() == ConnectionStatus::Open
    }

    /// Resolves once the transport reports [`ConnectionStatus::Open`].
    pub async fn wait_open(&self) {
        let mut status = self.inner.status.subscribe();
        let _ = status.wait_for(|s| *s == ConnectionStatus::Open).await;
    }

    /// Resolves once every frame accepted by [`send`](Self::send) has been
    /// written to its socket or dropped with it.
    pub async fn wait_flushed(&self) {
        let mut in_flight = self.inner.in_flight.subscribe();
        let _ = in_flight.wait_for(|n| *n == 0).await;
    }
}

impl fmt::Debug for TransportClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportClient")
            .field("url", &self.inner.config.url)
            .field("status", &self.status())
            .finish()
    }
}

impl TransportInner {
    fn lock_socket(&self) -> MutexGuard<'_, Option<mpsc::UnboundedSender<Message>>> {
        self.socket
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_status(&self, status: ConnectionStatus) {
        self.status.send_replace(status);
        info!("transport status: {status}");
        self.events.publish(TransportEvent::StatusChanged(status));
    }

    async fn connection_loop(&self, running: Arc<AtomicBool>) {
        let mut history = CloseHistory::new(self.config.backoff);

        while running.load(Ordering::Relaxed) {
            self.set_status(ConnectionStatus::Connecting);
            match connect_async(self.config.url.as_str()).await {
                Ok((socket, _response)) => {
                    info!("connected to hub at {}", self.config.url);
                    self.run_session(socket).await;
                }
                Err(e) => warn!("could not connect to hub at {}: {e}", self.config.url),
            }

            let retry_in = history.record_close(Instant::now().into_std());
            self.set_status(ConnectionStatus::Closed { retry_in });

            if running.load(Ordering::Relaxed) {
                time::sleep(retry_in).await;
            }
        }
    }

    /// Drives one open socket until it closes.
    async fn run_session(&self, socket: Socket) {
        let (mut sink, mut stream) = socket.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        *self.lock_socket() = Some(tx);
        self.set_status(ConnectionStatus::Open);

        let writer = async {
            while let Some(message) = rx.recv().await {
                let result = sink.send(message).await;
                self.in_flight.send_modify(|n| *n = n.saturating_sub(1));
                if let Err(e) = result {
                    warn!("failed to send frame: {e}");
                    break;
                }
            }
        };

        let reader = async {
            while let Some(message) = stream.next().await {
                match message {
                    Ok(Message::Close(frame)) => {
                        debug!("hub closed the connection: {frame:?}");
                        break;
                    }
                    Ok(Message::Binary(data)) => debug!("ignoring {} byte binary message", data.len()),
                    Ok(Message::Text(text)) => debug!("ignoring text message: {text}"),
                    Ok(_) => {}
                    Err(e) => {
                        warn!("socket error: {e}");
                        break;
                    }
                }
            }
        };

        tokio::select! {
            _ = writer => {}
            _ = reader => {}
        }

        self.lock_socket().take();
        // Frames still queued for this socket are lost with it.
        self.in_flight.send_replace(0);
        info!("connection to {} closed", self.config.url);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
