//! Binary codec for FileDrop frames.
//!
//! Wire format:
//! ```text
//! [header_len:4][header:header_len][payload:N]
//! ```
//! `header_len` is a signed 32-bit little-endian integer holding the **byte**
//! length of the UTF-8 JSON header (not its character count).  The payload is
//! the raw file content and runs to the end of the message; there is no
//! payload length, checksum, compression, or version field.
//!
//! One frame is always exactly one transport message, so the decoder expects
//! the whole buffer and never has to deal with partial reads.

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::protocol::header::FrameHeader;

/// Size of the header length prefix in bytes.
pub const HEADER_LEN_SIZE: usize = 4;

/// Smallest header length the decoder accepts.  Anything shorter cannot be a
/// JSON object with content.
pub const MIN_HEADER_LEN: i32 = 3;

/// Errors that can occur during frame encoding or decoding.
#[derive(Debug, Error)]
pub enum FrameError {
    /// No header was supplied to the encoder.
    #[error("invalid header: no header given")]
    InvalidHeader,

    /// The serialized header does not fit the 32-bit length prefix.
    #[error("header too large: {0} bytes")]
    HeaderTooLarge(usize),

    /// The buffer ends before the declared header does.
    #[error("truncated frame: need at least {needed} bytes, got {available}")]
    Truncated { needed: usize, available: usize },

    /// The declared header length is below [`MIN_HEADER_LEN`].
    #[error("header too short: length {0}")]
    HeaderTooShort(i32),

    /// The header could not be serialized or parsed as JSON.
    #[error("header json: {0}")]
    Json(#[from] serde_json::Error),
}

/// An immutable, fully encoded frame ready to hand to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame(Bytes);

impl EncodedFrame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The underlying buffer; cloning it does not copy the bytes.
    pub fn bytes(&self) -> Bytes {
        self.0.clone()
    }

    /// Byte length of the JSON header, read back from the length prefix.
    pub fn header_len(&self) -> usize {
        let mut prefix = [0u8; HEADER_LEN_SIZE];
        prefix.copy_from_slice(&self.0[..HEADER_LEN_SIZE]);
        i32::from_le_bytes(prefix) as usize
    }
}

impl From<EncodedFrame> for Bytes {
    fn from(frame: EncodedFrame) -> Self {
        frame.0
    }
}

impl AsRef<[u8]> for EncodedFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A frame split back into its header and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub header: FrameHeader,
    pub payload: Bytes,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes `header` and `payload` into a single frame.
///
/// The header is optional only so that a caller who failed to build one gets
/// a typed error from the same place as every other framing failure.
///
/// # Errors
///
/// - [`FrameError::InvalidHeader`] when `header` is `None`.
/// - [`FrameError::HeaderTooLarge`] when the JSON exceeds `i32::MAX` bytes.
/// - [`FrameError::Json`] if serialization fails.
///
/// # Examples
///
/// ```rust
/// use chrono::Utc;
/// use filedrop_core::{decode_frame, encode_frame, FrameHeader};
///
/// let header = FrameHeader::new("notes.txt", Utc::now(), "text/plain");
/// let frame = encode_frame(Some(&header), b"hello").unwrap();
/// let decoded = decode_frame(frame.as_bytes()).unwrap();
/// assert_eq!(decoded.header, header);
/// assert_eq!(&decoded.payload[..], b"hello");
/// ```
pub fn encode_frame(header: Option<&FrameHeader>, payload: &[u8]) -> Result<EncodedFrame, FrameError> {
    let header = header.ok_or(FrameError::InvalidHeader)?;
    let header_json = serde_json::to_vec(header)?;
    let header_len =
        i32::try_from(header_json.len()).map_err(|_| FrameError::HeaderTooLarge(header_json.len()))?;

    let mut buf = BytesMut::with_capacity(HEADER_LEN_SIZE + header_json.len() + payload.len());
    buf.put_i32_le(header_len);
    buf.put_slice(&header_json);
    buf.put_slice(payload);
    Ok(EncodedFrame(buf.freeze()))
}

/// Decodes one complete frame.
///
/// # Errors
///
/// - [`FrameError::Truncated`] when the buffer is shorter than the prefix or
///   the declared header.
/// - [`FrameError::HeaderTooShort`] when the declared length is below
///   [`MIN_HEADER_LEN`] (this includes negative values).
/// - [`FrameError::Json`] when the header bytes are not a valid header.
pub fn decode_frame(bytes: &[u8]) -> Result<DecodedFrame, FrameError> {
    if bytes.len() < HEADER_LEN_SIZE {
        return Err(FrameError::Truncated {
            needed: HEADER_LEN_SIZE,
            available: bytes.len(),
        });
    }

    let header_len = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if header_len < MIN_HEADER_LEN {
        return Err(FrameError::HeaderTooShort(header_len));
    }

    let header_end = HEADER_LEN_SIZE + header_len as usize;
    if bytes.len() < header_end {
        return Err(FrameError::Truncated {
            needed: header_end,
            available: bytes.len(),
        });
    }

    let header: FrameHeader = serde_json::from_slice(&bytes[HEADER_LEN_SIZE..header_end])?;
    Ok(DecodedFrame {
        header,
        payload: Bytes::copy_from_slice(&bytes[header_end..]),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
