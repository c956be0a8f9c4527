//! The drop zone: where the user hands files to the client.
//!
//! A desktop shell, a terminal, or a test reports drag gestures to
//! [`FileDropZone`], which turns them into [`DropZoneEvent`]s and a
//! human-readable status line:
//!
//! | Gesture                     | Events published                                 |
//! |-----------------------------|--------------------------------------------------|
//! | drag over, carrying files   | `DragOver(true)`, `StatusChanged("Let go to upload file(s)")` |
//! | drag over, carrying no files| `DragOver(false)`, `StatusChanged("Unsupported")` |
//! | drag leaves                 | `DragEnd`, `StatusChanged("File Drop Zone")`      |
//! | files dropped               | `FilesDropped(files)`, `DragEnd`, `StatusChanged("File Drop Zone")` |
//!
//! The zone reverts its status to idle by subscribing to its own `DragEnd`.

pub mod disk_file;
pub mod memory_file;

pub use disk_file::DiskFile;
pub use memory_file::MemoryFile;

use std::path::PathBuf;
use std::sync::{Arc, Weak};

use filedrop_core::{Event, EventRegistry};
use tracing::{debug, info};

use crate::application::encode_files::PendingFile;

/// Status text while nothing is being dragged.
pub const IDLE_STATUS: &str = "File Drop Zone";
/// Status text while files are held over the zone.
pub const DROP_STATUS: &str = "Let go to upload file(s)";
/// Status text while something other than files is held over the zone.
pub const UNSUPPORTED_STATUS: &str = "Unsupported";

/// Events published by the [`FileDropZone`].
#[derive(Debug, Clone)]
pub enum DropZoneEvent {
    /// Files were dropped, in the order the user supplied them.
    FilesDropped(Vec<PendingFile>),
    /// Something is being dragged over the zone; `true` when it carries files.
    DragOver(bool),
    /// The drag left the zone or ended in a drop.
    DragEnd,
    /// New status text for the zone.
    StatusChanged(String),
}

/// Subscription keys for [`DropZoneEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropZoneEventKind {
    FilesDropped,
    DragOver,
    DragEnd,
    StatusChanged,
}

impl Event for DropZoneEvent {
    type Kind = DropZoneEventKind;

    fn kind(&self) -> DropZoneEventKind {
        match self {
            Self::FilesDropped(_) => DropZoneEventKind::FilesDropped,
            Self::DragOver(_) => DropZoneEventKind::DragOver,
            Self::DragEnd => DropZoneEventKind::DragEnd,
            Self::StatusChanged(_) => DropZoneEventKind::StatusChanged,
        }
    }
}

/// Translates drag gestures into drop-zone events.
pub struct FileDropZone {
    events: Arc<EventRegistry<DropZoneEvent>>,
}

impl FileDropZone {
    pub fn new() -> Self {
        let events = Arc::new(EventRegistry::new());
        // Weak, so the registry does not own a handler that owns the registry.
        let weak: Weak<EventRegistry<DropZoneEvent>> = Arc::downgrade(&events);
        events.subscribe(DropZoneEventKind::DragEnd, move |_| {
            if let Some(events) = weak.upgrade() {
                events.publish(DropZoneEvent::StatusChanged(IDLE_STATUS.to_string()));
            }
        });
        Self { events }
    }

    /// Registers `handler` for events of `kind`.
    pub fn subscribe<F>(&self, kind: DropZoneEventKind, handler: F)
    where
        F: Fn(&DropZoneEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(kind, handler);
    }

    pub fn drag_over(&self, has_files: bool) {
        self.events.publish(DropZoneEvent::DragOver(has_files));
        let status = if has_files { DROP_STATUS } else { UNSUPPORTED_STATUS };
        self.events.publish(DropZoneEvent::StatusChanged(status.to_string()));
    }

    pub fn drag_leave(&self) {
        self.events.publish(DropZoneEvent::DragEnd);
    }

    /// Hands `files` to subscribers, then ends the drag.
    pub fn drop_files(&self, files: Vec<PendingFile>) {
        info!("{} file(s) dropped", files.len());
        self.events.publish(DropZoneEvent::FilesDropped(files));
        self.events.publish(DropZoneEvent::DragEnd);
    }

    /// Opens each path as a [`DiskFile`] and drops them all at once.
    pub async fn drop_paths<I>(&self, paths: I)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut files: Vec<PendingFile> = Vec::new();
        for path in paths {
            debug!("opening dropped path {}", path.display());
            files.push(Arc::new(DiskFile::open(path).await));
        }
        self.drop_files(files);
    }
}

impl Default for FileDropZone {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
