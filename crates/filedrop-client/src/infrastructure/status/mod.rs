//! Status board: one snapshot of everything the user should see.
//!
//! The board only subscribes; it never calls into the components it
//! watches.  Front ends (the CLI's log line, a tray icon, a test) read
//! [`StatusBoard::snapshot`] whenever they need to render.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::application::encode_files::{EncoderEvent, EncoderEventKind, EncodingWorker};
use crate::infrastructure::drop_zone::{DropZoneEvent, DropZoneEventKind, FileDropZone, IDLE_STATUS};
use crate::infrastructure::transport::{
    ConnectionStatus, TransportClient, TransportError, TransportEvent, TransportEventKind,
};

/// Point-in-time view of the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Files waiting to be encoded.
    pub queue_size: usize,
    pub connection: ConnectionStatus,
    /// Current drop-zone status text.
    pub drop_zone: String,
    pub files_encoded: u64,
    pub files_failed: u64,
    /// Frames handed to an open socket.
    pub files_sent: u64,
    /// Frames encoded while no socket was open, and therefore lost.
    pub files_unsent: u64,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            queue_size: 0,
            connection: ConnectionStatus::Connecting,
            drop_zone: IDLE_STATUS.to_string(),
            files_encoded: 0,
            files_failed: 0,
            files_sent: 0,
            files_unsent: 0,
        }
    }
}

/// Aggregates events from the drop zone, encoder and transport.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    state: Arc<Mutex<StatusSnapshot>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        lock(&self.state).clone()
    }

    pub fn watch_drop_zone(&self, zone: &FileDropZone) {
        let state = Arc::clone(&self.state);
        zone.subscribe(DropZoneEventKind::StatusChanged, move |event| {
            if let DropZoneEvent::StatusChanged(text) = event {
                lock(&state).drop_zone = text.clone();
            }
        });
    }

    pub fn watch_encoder(&self, encoder: &EncodingWorker) {
        let state = Arc::clone(&self.state);
        encoder.subscribe(EncoderEventKind::QueueSizeChanged, move |event| {
            if let EncoderEvent::QueueSizeChanged(size) = event {
                lock(&state).queue_size = *size;
            }
        });

        let state = Arc::clone(&self.state);
        encoder.subscribe(EncoderEventKind::FileEncoded, move |_| {
            lock(&state).files_encoded += 1;
        });

        let state = Arc::clone(&self.state);
        encoder.subscribe(EncoderEventKind::Error, move |_| {
            lock(&state).files_failed += 1;
        });
    }

    pub fn watch_transport(&self, transport: &TransportClient) {
        let state = Arc::clone(&self.state);
        transport.subscribe(TransportEventKind::StatusChanged, move |event| {
            let TransportEvent::StatusChanged(status) = event;
            lock(&state).connection = *status;
        });
    }

    /// Counts the outcome of one [`TransportClient::send`].
    pub fn record_send(&self, result: &Result<(), TransportError>) {
        let mut state = lock(&self.state);
        match result {
            Ok(()) => state.files_sent += 1,
            Err(_) => state.files_unsent += 1,
        }
    }
}

fn lock(state: &Mutex<StatusSnapshot>) -> MutexGuard<'_, StatusSnapshot> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
