//! Protocol module containing the frame header type and the binary frame codec.

pub mod frame;
pub mod header;

pub use frame::{decode_frame, encode_frame, DecodedFrame, EncodedFrame, FrameError};
pub use header::FrameHeader;
