//! Encode-files use case: turns dropped files into frames, one at a time.
//!
//! # How the queue is drained (for beginners)
//!
//! Dropping files only *queues* them.  The first `enqueue` that finds no
//! drain running spawns one Tokio task, and that task keeps taking files
//! from the front of the queue until it finds the queue empty.  Files queued
//! while the task is busy are picked up by the same task, so:
//!
//! - at most one file is being read or framed at any moment,
//! - frames come out in exactly the order files were queued, across calls,
//! - a file that fails is reported and skipped; the next one still runs.
//!
//! ```text
//! enqueue([a, b]) ──┐
//!                   ├──> queue [a, b, c] ──> drain task ──> FileEncoded(a)
//! enqueue([c]) ─────┘                                   ──> FileEncoded(b)
//!                                                       ──> FileEncoded(c)
//! ```
//!
//! The file source is injected through the [`DroppedFile`] trait, so the
//! worker never touches the file system itself.

use std::collections::VecDeque;
use std::fmt::Debug;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use filedrop_core::{encode_frame, EncodedFrame, Event, EventRegistry, FrameError, FrameHeader};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error};

// ── File source seam ──────────────────────────────────────────────────────────

/// A file handed to the client by the user.
///
/// Implemented by `DiskFile` and `MemoryFile` in the infrastructure layer and
/// mocked in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DroppedFile: Debug + Send + Sync {
    /// Name used in logs and errors, available even when no header can be
    /// built.
    fn display_name(&self) -> String;

    /// Frame header built from the file's metadata, or `None` when the
    /// metadata is incomplete (for example a path without a file name).
    fn header(&self) -> Option<FrameHeader>;

    /// Reads the complete file content.
    async fn read_content(&self) -> io::Result<Vec<u8>>;
}

/// Shared handle to a queued file.
pub type PendingFile = Arc<dyn DroppedFile>;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Why a single file could not be encoded.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The file content could not be read.
    #[error("failed to read {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: io::Error,
    },

    /// The framer rejected the file, most often because it had no header.
    #[error("failed to frame {name}: {source}")]
    Frame {
        name: String,
        #[source]
        source: FrameError,
    },
}

impl EncodeError {
    /// Display name of the file that failed.
    pub fn file_name(&self) -> &str {
        match self {
            Self::Read { name, .. } | Self::Frame { name, .. } => name,
        }
    }
}

// ── Events ────────────────────────────────────────────────────────────────────

/// Events published by the [`EncodingWorker`].
#[derive(Debug)]
pub enum EncoderEvent {
    /// Queue length after an enqueue or after an item was processed.
    QueueSizeChanged(usize),
    /// A file was framed successfully.
    FileEncoded(EncodedFrame),
    /// A file failed; the drain carries on with the next one.
    Error(EncodeError),
}

/// Subscription keys for [`EncoderEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncoderEventKind {
    QueueSizeChanged,
    FileEncoded,
    Error,
}

impl Event for EncoderEvent {
    type Kind = EncoderEventKind;

    fn kind(&self) -> EncoderEventKind {
        match self {
            Self::QueueSizeChanged(_) => EncoderEventKind::QueueSizeChanged,
            Self::FileEncoded(_) => EncoderEventKind::FileEncoded,
            Self::Error(_) => EncoderEventKind::Error,
        }
    }
}

// ── Worker ────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct WorkerState {
    queue: VecDeque<PendingFile>,
    drain: Option<JoinHandle<()>>,
}

struct WorkerInner {
    events: EventRegistry<EncoderEvent>,
    state: Mutex<WorkerState>,
    /// Held across reading the queue length and publishing it, so sizes
    /// reach subscribers in the order they were read.
    size_publish: Mutex<()>,
    /// `true` while no drain task exists.
    idle: watch::Sender<bool>,
}

impl WorkerInner {
    fn lock_state(&self) -> MutexGuard<'_, WorkerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Publishes the current queue length.
    ///
    /// The length is read after taking `size_publish`, so the last size
    /// published always matches the queue as it was after the last change.
    fn publish_queue_size(&self) {
        let _ordered = self
            .size_publish
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let len = self.lock_state().queue.len();
        debug!("encode queue length is now {len}");
        self.events.publish(EncoderEvent::QueueSizeChanged(len));
    }
}

/// Serialises file encoding through a single background drain.
///
/// Cloning the worker yields another handle to the same queue.
#[derive(Clone)]
pub struct EncodingWorker {
    inner: Arc<WorkerInner>,
}

impl EncodingWorker {
    /// Creates an idle worker with an empty queue.
    pub fn new() -> Self {
        let (idle, _) = watch::channel(true);
        Self {
            inner: Arc::new(WorkerInner {
                events: EventRegistry::new(),
                state: Mutex::new(WorkerState::default()),
                size_publish: Mutex::new(()),
                idle,
            }),
        }
    }

    /// Registers `handler` for events of `kind`.
    pub fn subscribe<F>(&self, kind: EncoderEventKind, handler: F)
    where
        F: Fn(&EncoderEvent) + Send + Sync + 'static,
    {
        self.inner.events.subscribe(kind, handler);
    }

    /// Appends `files` to the queue and makes sure a drain is running.
    ///
    /// Publishes [`EncoderEvent::QueueSizeChanged`] with the queue length,
    /// even when `files` is empty.  Must be called from within a Tokio
    /// runtime.
    ///
    /// A `QueueSizeChanged` handler must not call `enqueue` itself.
    pub fn enqueue<I>(&self, files: I)
    where
        I: IntoIterator<Item = PendingFile>,
    {
        self.inner.lock_state().queue.extend(files);
        self.inner.publish_queue_size();
        self.ensure_draining();
    }

    /// Number of files waiting to be encoded, not counting the one in flight.
    pub fn queue_len(&self) -> usize {
        self.inner.lock_state().queue.len()
    }

    /// `true` when no drain task is running.
    pub fn is_idle(&self) -> bool {
        *self.inner.idle.borrow()
    }

    /// Resolves once the drain has emptied the queue and exited.
    pub async fn wait_idle(&self) {
        let mut idle = self.inner.idle.subscribe();
        // The sender lives in `inner`, which we hold, so this cannot fail.
        let _ = idle.wait_for(|idle| *idle).await;
    }

    fn ensure_draining(&self) {
        let mut state = self.inner.lock_state();
        if state.drain.is_some() || state.queue.is_empty() {
            return;
        }
        self.inner.idle.send_replace(false);
        let inner = Arc::clone(&self.inner);
        state.drain = Some(tokio::spawn(drain(inner)));
    }
}

impl Default for EncodingWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for EncodingWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodingWorker")
            .field("queue_len", &self.queue_len())
            .field("idle", &self.is_idle())
            .finish()
    }
}

/// Processes queued files until the queue is observed empty.
///
/// Taking the next file and clearing the drain handle happen under the same
/// lock as `ensure_draining`, so a file queued concurrently is either seen
/// here or starts a fresh drain.
async fn drain(inner: Arc<WorkerInner>) {
    loop {
        let file = {
            let mut state = inner.lock_state();
            match state.queue.pop_front() {
                Some(file) => file,
                None => {
                    state.drain = None;
                    inner.idle.send_replace(true);
                    return;
                }
            }
        };

        match encode_file(file.as_ref()).await {
            Ok(frame) => {
                debug!("encoded {} ({} bytes)", file.display_name(), frame.len());
                inner.events.publish(EncoderEvent::FileEncoded(frame));
            }
            Err(e) => {
                error!("{e}");
                inner.events.publish(EncoderEvent::Error(e));
            }
        }

        inner.publish_queue_size();
    }
}

/// Builds the header, reads the content and frames one file.
///
/// # Errors
///
/// [`EncodeError::Read`] if the content cannot be read, otherwise
/// [`EncodeError::Frame`] if the framer rejects the file.
pub async fn encode_file(file: &dyn DroppedFile) -> Result<EncodedFrame, EncodeError> {
    let header = file.header();
    let content = file.read_content().await.map_err(|source| EncodeError::Read {
        name: file.display_name(),
        source,
    })?;
    encode_frame(header.as_ref(), &content).map_err(|source| EncodeError::Frame {
        name: file.display_name(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use filedrop_core::decode_frame;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn header(name: &str) -> FrameHeader {
        FrameHeader::new(
            name,
            Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            "text/plain",
        )
    }

    fn good_file(name: &'static str, content: &'static [u8]) -> PendingFile {
        let mut file = MockDroppedFile::new();
        file.expect_display_name().return_const(name.to_string());
        file.expect_header().returning(move || Some(header(name)));
        file.expect_read_content()
            .times(1)
            .returning(move || Ok(content.to_vec()));
        Arc::new(file)
    }

    fn headerless_file(name: &'static str) -> PendingFile {
        let mut file = MockDroppedFile::new();
        file.expect_display_name().return_const(name.to_string());
        file.expect_header().returning(|| None);
        file.expect_read_content().returning(|| Ok(b"orphan".to_vec()));
        Arc::new(file)
    }

    fn unreadable_file(name: &'static str) -> PendingFile {
        let mut file = MockDroppedFile::new();
        file.expect_display_name().return_const(name.to_string());
        file.expect_header().returning(move || Some(header(name)));
        file.expect_read_content()
            .returning(|| Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")));
        Arc::new(file)
    }

    /// Records a compact trace of every event the worker publishes.
    fn record_events(worker: &EncodingWorker) -> Arc<Mutex<Vec<String>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        for kind in [
            EncoderEventKind::QueueSizeChanged,
            EncoderEventKind::FileEncoded,
            EncoderEventKind::Error,
        ] {
            let log = Arc::clone(&log);
            worker.subscribe(kind, move |event| {
                let entry = match event {
                    EncoderEvent::QueueSizeChanged(n) => format!("size:{n}"),
                    EncoderEvent::FileEncoded(frame) => {
                        let decoded = decode_frame(frame.as_bytes()).unwrap();
                        format!("encoded:{}", decoded.header.name)
                    }
                    EncoderEvent::Error(e) => format!("error:{}", e.file_name()),
                };
                log.lock().unwrap().push(entry);
            });
        }
        log
    }

    #[tokio::test]
    async fn test_new_worker_is_idle_with_empty_queue() {
        let worker = EncodingWorker::new();

        assert!(worker.is_idle());
        assert_eq!(worker.queue_len(), 0);
        tokio_test::assert_ready!(tokio_test::task::spawn(worker.wait_idle()).poll());
    }

    #[tokio::test]
    async fn test_enqueue_publishes_new_queue_length_before_processing() {
        // Arrange
        let worker = EncodingWorker::new();
        let log = record_events(&worker);

        // Act
        worker.enqueue(vec![good_file("a", b"1"), good_file("b", b"2")]);

        // Assert: the enqueue event is published synchronously
        assert_eq!(log.lock().unwrap().first().map(String::as_str), Some("size:2"));
        worker.wait_idle().await;
    }

    #[tokio::test]
    async fn test_drain_encodes_in_order_and_reports_queue_after_each_item() {
        // Arrange
        let worker = EncodingWorker::new();
        let log = record_events(&worker);

        // Act
        worker.enqueue(vec![good_file("a", b"1"), good_file("b", b"2")]);
        worker.wait_idle().await;

        // Assert
        assert_eq!(
            *log.lock().unwrap(),
            vec!["size:2", "encoded:a", "size:1", "encoded:b", "size:0"]
        );
        assert!(worker.is_idle());
    }

    #[tokio::test]
    async fn test_missing_header_reports_error_and_continues() {
        // Arrange
        let worker = EncodingWorker::new();
        let log = record_events(&worker);

        // Act
        worker.enqueue(vec![good_file("a", b"1"), headerless_file("b"), good_file("c", b"3")]);
        worker.wait_idle().await;

        // Assert
        let log = log.lock().unwrap();
        let outcomes: Vec<&str> = log
            .iter()
            .map(String::as_str)
            .filter(|e| !e.starts_with("size:"))
            .collect();
        assert_eq!(outcomes, vec!["encoded:a", "error:b", "encoded:c"]);
    }

    #[tokio::test]
    async fn test_missing_header_error_wraps_invalid_header() {
        let file = headerless_file("nameless");

        let err = encode_file(file.as_ref()).await.unwrap_err();

        assert!(matches!(
            err,
            EncodeError::Frame {
                source: FrameError::InvalidHeader,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_read_failure_is_reported_as_read_error() {
        let file = unreadable_file("secret.txt");

        let err = encode_file(file.as_ref()).await.unwrap_err();

        assert!(matches!(err, EncodeError::Read { ref name, .. } if name == "secret.txt"));
        assert!(err.to_string().contains("denied"));
    }

    #[tokio::test]
    async fn test_panicking_subscriber_does_not_stop_the_drain() {
        // Arrange
        let worker = EncodingWorker::new();
        worker.subscribe(EncoderEventKind::FileEncoded, |_| panic!("subscriber bug"));
        let encoded = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&encoded);
        worker.subscribe(EncoderEventKind::FileEncoded, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        // Act
        worker.enqueue(vec![good_file("a", b"1"), good_file("b", b"2")]);
        worker.wait_idle().await;

        // Assert
        assert_eq!(encoded.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_enqueue_publishes_size_without_spawning_a_drain() {
        let worker = EncodingWorker::new();
        let log = record_events(&worker);

        worker.enqueue(Vec::new());

        assert_eq!(*log.lock().unwrap(), vec!["size:0"]);
        assert!(worker.is_idle());
    }

    #[tokio::test]
    async fn test_worker_restarts_drain_after_going_idle() {
        // Arrange
        let worker = EncodingWorker::new();
        let log = record_events(&worker);
        worker.enqueue(vec![good_file("first", b"1")]);
        worker.wait_idle().await;

        // Act
        worker.enqueue(vec![good_file("second", b"2")]);
        worker.wait_idle().await;

        // Assert
        let log = log.lock().unwrap();
        assert!(log.contains(&"encoded:first".to_string()));
        assert!(log.contains(&"encoded:second".to_string()));
        assert_eq!(log.last().map(String::as_str), Some("size:0"));
    }
}
