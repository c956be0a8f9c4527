//! [`DroppedFile`] whose content is already in memory, such as pasted data.

use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use filedrop_core::FrameHeader;

use crate::application::encode_files::DroppedFile;

/// An in-memory file.
#[derive(Debug, Clone)]
pub struct MemoryFile {
    label: String,
    header: Option<FrameHeader>,
    content: Bytes,
}

impl MemoryFile {
    pub fn new(header: FrameHeader, content: impl Into<Bytes>) -> Self {
        Self {
            label: header.name.clone(),
            header: Some(header),
            content: content.into(),
        }
    }

    /// A blob with no usable metadata; the encoder will reject it.
    pub fn without_header(label: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            label: label.into(),
            header: None,
            content: content.into(),
        }
    }
}

#[async_trait]
impl DroppedFile for MemoryFile {
    fn display_name(&self) -> String {
        self.label.clone()
    }

    fn header(&self) -> Option<FrameHeader> {
        self.header.clone()
    }

    async fn read_content(&self) -> io::Result<Vec<u8>> {
        Ok(self.content.to_vec())
    }
}
