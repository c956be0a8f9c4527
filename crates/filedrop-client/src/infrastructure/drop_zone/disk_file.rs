//! [`DroppedFile`] backed by a path on the local file system.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use filedrop_core::FrameHeader;

use crate::application::encode_files::DroppedFile;

/// A file dropped by path.
///
/// Metadata is captured when the file is opened; the content is read only
/// when the encoder gets to it.
#[derive(Debug, Clone)]
pub struct DiskFile {
    path: PathBuf,
    header: Option<FrameHeader>,
}

impl DiskFile {
    /// Captures the file's name, modification time and guessed MIME type.
    ///
    /// Never fails: a path without a UTF-8 file name gets no header, and an
    /// unreadable modification time falls back to the current time.  Read
    /// errors surface later, from the encoder.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let modified = tokio::fs::metadata(&path)
            .await
            .and_then(|meta| meta.modified())
            .unwrap_or_else(|_| SystemTime::now());
        let header = file_name(&path)
            .map(|name| FrameHeader::from_system_time(name, modified, guess_mime_type(&path)));
        Self { path, header }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DroppedFile for DiskFile {
    fn display_name(&self) -> String {
        self.path.display().to_string()
    }

    fn header(&self) -> Option<FrameHeader> {
        self.header.clone()
    }

    async fn read_content(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}

/// MIME type from the extension, or an empty string when unknown.
fn guess_mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or_default()
        .to_string()
}
