//! Composition root: builds the client components and subscribes them to
//! each other.
//!
//! ```text
//! FileDropZone ──FilesDropped──> EncodingWorker::enqueue
//! EncodingWorker ──FileEncoded──> TransportClient::send
//! every component ──*──────────> StatusBoard
//! ```

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::warn;

use crate::application::encode_files::{EncoderEvent, EncoderEventKind, EncodingWorker};
use crate::infrastructure::drop_zone::{DropZoneEvent, DropZoneEventKind, FileDropZone};
use crate::infrastructure::status::StatusBoard;
use crate::infrastructure::transport::{TransportClient, TransportConfig};

/// The wired-up client.
pub struct FileDropApp {
    pub drop_zone: FileDropZone,
    pub encoder: EncodingWorker,
    pub transport: TransportClient,
    pub status: StatusBoard,
}

impl FileDropApp {
    /// Builds every component and subscribes them to each other.
    ///
    /// Nothing connects until [`start`](Self::start) is called.
    pub fn new(config: TransportConfig) -> Self {
        let drop_zone = FileDropZone::new();
        let encoder = EncodingWorker::new();
        let transport = TransportClient::new(config);
        let status = StatusBoard::new();

        let queue = encoder.clone();
        drop_zone.subscribe(DropZoneEventKind::FilesDropped, move |event| {
            if let DropZoneEvent::FilesDropped(files) = event {
                queue.enqueue(files.iter().cloned());
            }
        });

        let sender = transport.clone();
        let board = status.clone();
        encoder.subscribe(EncoderEventKind::FileEncoded, move |event| {
            if let EncoderEvent::FileEncoded(frame) = event {
                let result = sender.send(frame);
                if let Err(e) = &result {
                    warn!("dropping frame of {} bytes: {e}", frame.len());
                }
                board.record_send(&result);
            }
        });

        status.watch_drop_zone(&drop_zone);
        status.watch_encoder(&encoder);
        status.watch_transport(&transport);

        Self {
            drop_zone,
            encoder,
            transport,
            status,
        }
    }

    /// Starts the transport's connection loop.
    pub fn start(&self, running: Arc<AtomicBool>) -> JoinHandle<()> {
        self.transport.start(running)
    }

    /// Resolves once every queued file is encoded and every frame handed to
    /// the transport has been written.
    pub async fn wait_idle(&self) {
        self.encoder.wait_idle().await;
        self.transport.wait_flushed().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::encode_files::PendingFile;
    use crate::infrastructure::drop_zone::MemoryFile;
    use chrono::Utc;
    use filedrop_core::FrameHeader;

    #[tokio::test]
    async fn test_drop_without_connection_encodes_but_cannot_send() {
        // Arrange
        let app = FileDropApp::new(TransportConfig::default());
        let files: Vec<PendingFile> = vec![Arc::new(MemoryFile::new(
            FrameHeader::new("a.txt", Utc::now(), "text/plain"),
            &b"a"[..],
        ))];

        // Act
        app.drop_zone.drop_files(files);
        app.wait_idle().await;

        // Assert: the frame was built and the send failure was only logged
        let snap = app.status.snapshot();
        assert_eq!(snap.files_encoded, 1);
        assert_eq!(snap.files_failed, 0);
        assert_eq!(snap.files_sent, 0);
        assert_eq!(snap.files_unsent, 1);
        assert_eq!(snap.drop_zone, "File Drop Zone");
    }
}
