//! Receive-file use case: one binary message in, one file on disk out.
//!
//! The header's `name` comes from the remote side, so only its final path
//! component is used.  `../../etc/passwd` is stored as `passwd` inside the
//! output directory, and names that reduce to nothing are rejected.  A file
//! with the same name as an earlier one replaces it.

use std::path::{Path, PathBuf};

use filedrop_core::{decode_frame, FrameError, FrameHeader};
use thiserror::Error;

/// Why a received message could not be stored.
#[derive(Debug, Error)]
pub enum ReceiveError {
    /// The message is not a valid frame.
    #[error("invalid frame: {0}")]
    Frame(#[from] FrameError),

    /// The header name has no usable final component.
    #[error("unsafe file name: {0:?}")]
    UnsafeName(String),

    /// Writing the file failed.
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A file written by [`store_frame`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub path: PathBuf,
    pub header: FrameHeader,
    /// Payload length in bytes.
    pub size: usize,
}

/// Resolves the path a file named `name` is stored at inside `out_dir`.
///
/// Both `/` and `\` count as separators, whatever the host platform.
///
/// # Errors
///
/// [`ReceiveError::UnsafeName`] when the final component is empty, `.` or
/// `..`.
pub fn stored_path(out_dir: &Path, name: &str) -> Result<PathBuf, ReceiveError> {
    let file_name = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if file_name.is_empty() || file_name == "." || file_name == ".." {
        return Err(ReceiveError::UnsafeName(name.to_string()));
    }
    Ok(out_dir.join(file_name))
}

/// Decodes `message` and writes its payload into `out_dir`.
///
/// # Errors
///
/// [`ReceiveError::Frame`] for malformed frames, [`ReceiveError::UnsafeName`]
/// for unusable names and [`ReceiveError::Io`] when the write fails.
pub async fn store_frame(out_dir: &Path, message: &[u8]) -> Result<StoredFile, ReceiveError> {
    let frame = decode_frame(message)?;
    let path = stored_path(out_dir, &frame.header.name)?;
    tokio::fs::write(&path, &frame.payload)
        .await
        .map_err(|source| ReceiveError::Io {
            path: path.clone(),
            source,
        })?;
    Ok(StoredFile {
        path,
        size: frame.payload.len(),
        header: frame.header,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
