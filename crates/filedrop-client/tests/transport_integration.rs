//! Integration tests for the WebSocket transport and the full client → hub
//! path.
//!
//! Every test runs a real WebSocket server on an ephemeral loopback port.
//! Backoff policies are shrunk to tens of milliseconds so reconnects happen
//! quickly while keeping the linear `base × closes` shape observable.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use filedrop_client::app::FileDropApp;
use filedrop_client::infrastructure::transport::{
    ConnectionStatus, TransportClient, TransportConfig, TransportError, TransportEvent,
    TransportEventKind,
};
use filedrop_core::{decode_frame, encode_frame, BackoffPolicy, FrameHeader};
use filedrop_server::domain::ServerConfig;
use futures_util::StreamExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

const BASE: Duration = Duration::from_millis(40);

fn fast_policy() -> BackoffPolicy {
    BackoffPolicy::new(BASE, Duration::from_secs(2), Duration::from_secs(60))
}

/// Records every status the transport publishes.
fn record_statuses(transport: &TransportClient) -> Arc<Mutex<Vec<ConnectionStatus>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    transport.subscribe(TransportEventKind::StatusChanged, move |event| {
        let TransportEvent::StatusChanged(status) = event;
        sink.lock().unwrap().push(*status);
    });
    log
}

async fn wait_until<F: Fn() -> bool>(what: &str, condition: F) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {what}"));
}

/// A server that completes the handshake and immediately hangs up, except
/// on connection number `keep_from` and later, whose binary messages are
/// forwarded to the returned channel.
async fn flaky_server(keep_from: usize) -> (String, mpsc::UnboundedReceiver<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut accepted = 0usize;
        while let Ok((stream, _)) = listener.accept().await {
            accepted += 1;
            let Ok(mut ws) = accept_async(stream).await else {
                continue;
            };
            if accepted < keep_from {
                drop(ws);
                continue;
            }
            let tx = tx.clone();
            tokio::spawn(async move {
                while let Some(Ok(message)) = ws.next().await {
                    if let Message::Binary(data) = message {
                        let _ = tx.send(data);
                    }
                }
            });
        }
    });

    (format!("ws://{addr}/hub"), rx)
}

fn sample_frame(name: &str, payload: &[u8]) -> filedrop_core::EncodedFrame {
    encode_frame(Some(&FrameHeader::new(name, Utc::now(), "text/plain")), payload).unwrap()
}

// ── Transport lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_reconnects_after_each_close_with_growing_delay() {
    // Arrange: the first two connections are dropped right after the handshake
    let (url, _rx) = flaky_server(3).await;
    let transport = TransportClient::new(TransportConfig {
        url,
        backoff: fast_policy(),
    });
    let statuses = record_statuses(&transport);
    let running = Arc::new(AtomicBool::new(true));

    // Act
    let handle = transport.start(Arc::clone(&running));
    wait_until("third open", || {
        statuses
            .lock()
            .unwrap()
            .iter()
            .filter(|s| **s == ConnectionStatus::Open)
            .count()
            >= 3
    })
    .await;
    running.store(false, Ordering::Relaxed);
    handle.abort();

    // Assert
    let statuses = statuses.lock().unwrap();
    let expected = [
        ConnectionStatus::Connecting,
        ConnectionStatus::Open,
        ConnectionStatus::Closed { retry_in: BASE },
        ConnectionStatus::Connecting,
        ConnectionStatus::Open,
        ConnectionStatus::Closed { retry_in: BASE * 2 },
        ConnectionStatus::Connecting,
        ConnectionStatus::Open,
    ];
    assert_eq!(statuses[..expected.len()], expected);
    assert!(transport.is_open());
}

#[tokio::test]
async fn test_send_after_reconnect_uses_the_new_socket() {
    // Arrange
    let (url, mut rx) = flaky_server(2).await;
    let transport = TransportClient::new(TransportConfig {
        url,
        backoff: fast_policy(),
    });
    let statuses = record_statuses(&transport);
    let running = Arc::new(AtomicBool::new(true));
    let handle = transport.start(Arc::clone(&running));
    wait_until("second open", || {
        statuses
            .lock()
            .unwrap()
            .iter()
            .filter(|s| **s == ConnectionStatus::Open)
            .count()
            >= 2
    })
    .await;

    // Act
    transport.send(&sample_frame("late.txt", b"after reconnect")).unwrap();
    let received = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("frame arrives")
        .expect("server alive");

    // Assert
    let decoded = decode_frame(&received).unwrap();
    assert_eq!(decoded.header.name, "late.txt");
    assert_eq!(decoded.payload.as_ref(), b"after reconnect");

    running.store(false, Ordering::Relaxed);
    handle.abort();
}

#[tokio::test]
async fn test_send_during_backoff_is_rejected_and_never_delivered() {
    // Arrange: the first session is dropped by the server, the second kept
    let (url, mut rx) = flaky_server(2).await;
    let transport = TransportClient::new(TransportConfig {
        url,
        backoff: fast_policy(),
    });
    let statuses = record_statuses(&transport);
    let backoff_sends = Arc::new(Mutex::new(Vec::new()));
    {
        let sender = transport.clone();
        let results = Arc::clone(&backoff_sends);
        transport.subscribe(TransportEventKind::StatusChanged, move |event| {
            if let TransportEvent::StatusChanged(ConnectionStatus::Closed { .. }) = event {
                let mut results = results.lock().unwrap();
                if results.is_empty() {
                    results.push(sender.send(&sample_frame("lost.txt", b"during backoff")));
                }
            }
        });
    }
    let running = Arc::new(AtomicBool::new(true));

    // Act
    let handle = transport.start(Arc::clone(&running));
    wait_until("reopen after the dropped session", || {
        statuses
            .lock()
            .unwrap()
            .iter()
            .filter(|s| **s == ConnectionStatus::Open)
            .count()
            >= 2
    })
    .await;
    transport.send(&sample_frame("kept.txt", b"after reconnect")).unwrap();
    let received = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("frame arrives")
        .expect("server alive");

    // Assert
    let expected: Vec<Result<(), TransportError>> = vec![Err(TransportError::NotOpen)];
    assert_eq!(*backoff_sends.lock().unwrap(), expected);
    assert_eq!(decode_frame(&received).unwrap().header.name, "kept.txt");
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(rx.try_recv().is_err(), "nothing else reaches the hub");

    running.store(false, Ordering::Relaxed);
    handle.abort();
}

#[tokio::test]
async fn test_send_before_first_connection_is_rejected() {
    let transport = TransportClient::new(TransportConfig {
        url: "ws://127.0.0.1:1/hub".to_string(),
        backoff: fast_policy(),
    });

    let result = transport.send(&sample_frame("early.txt", b"x"));

    assert_eq!(result, Err(TransportError::NotOpen));
}

// ── Client → hub ──────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dropped_files_arrive_at_the_hub() {
    // Arrange: a hub writing into its own temp directory
    let root = std::env::temp_dir().join(format!("filedrop_e2e_{}", Uuid::new_v4()));
    let out_dir = root.join("received");
    let src_dir = root.join("outbox");
    std::fs::create_dir_all(&src_dir).unwrap();
    let hub_config = ServerConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        out_dir: out_dir.clone(),
    };
    let listener = filedrop_server::infrastructure::bind(&hub_config).await.unwrap();
    let hub_addr = listener.local_addr().unwrap();
    let hub_running = Arc::new(AtomicBool::new(true));
    tokio::spawn(filedrop_server::infrastructure::serve(
        listener,
        out_dir.clone(),
        Arc::clone(&hub_running),
    ));

    let files: Vec<(PathBuf, Vec<u8>)> = vec![
        (src_dir.join("notes.txt"), b"remember the milk".to_vec()),
        (src_dir.join("pixel.png"), vec![0x89, b'P', b'N', b'G', 0, 255]),
    ];
    for (path, content) in &files {
        std::fs::write(path, content).unwrap();
    }

    let app = FileDropApp::new(TransportConfig {
        url: format!("ws://{hub_addr}/hub"),
        backoff: fast_policy(),
    });
    let running = Arc::new(AtomicBool::new(true));
    let handle = app.start(Arc::clone(&running));

    // Act
    tokio::time::timeout(Duration::from_secs(5), app.transport.wait_open())
        .await
        .expect("transport opens");
    app.drop_zone
        .drop_paths(files.iter().map(|(path, _)| path.clone()))
        .await;
    app.wait_idle().await;

    // Assert
    for (path, content) in &files {
        let stored = out_dir.join(path.file_name().unwrap());
        wait_until("file stored by hub", || {
            std::fs::read(&stored).map(|c| &c == content).unwrap_or(false)
        })
        .await;
    }
    let snap = app.status.snapshot();
    assert_eq!(snap.files_encoded, 2);
    assert_eq!(snap.files_sent, 2);
    assert_eq!(snap.files_failed, 0);
    assert_eq!(snap.connection, ConnectionStatus::Open);

    running.store(false, Ordering::Relaxed);
    hub_running.store(false, Ordering::Relaxed);
    handle.abort();
    let _ = std::fs::remove_dir_all(root);
}
