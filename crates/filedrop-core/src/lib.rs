//! # filedrop-core
//!
//! Shared library for FileDrop containing the typed event registry, the
//! binary frame codec, and the reconnect backoff policy.
//!
//! This crate is used by both the client and the receiving hub.  It opens no
//! sockets and touches no files.
//!
//! # Architecture overview (for beginners)
//!
//! FileDrop lets a user drop files onto a client, which turns every file into
//! a single binary *frame* and streams the frames over one long-lived
//! WebSocket connection to a hub that writes them back to disk.
//!
//! This crate (`filedrop-core`) is the shared foundation.  It defines:
//!
//! - **`events`** – A small publish/subscribe registry.  Components never call
//!   each other directly; they publish events and whoever cares subscribes.
//!
//! - **`protocol`** – How bytes travel over the network.  A frame is a 4-byte
//!   little-endian header length, a JSON header, and the raw file bytes.
//!
//! - **`domain`** – Pure business logic with no I/O.  The important piece is
//!   the reconnect backoff: a linear delay driven by how many times the
//!   connection closed in the last five minutes.

pub mod domain;
pub mod events;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `filedrop_core::EventRegistry` instead of `filedrop_core::events::registry::EventRegistry`.
pub use domain::backoff::{BackoffPolicy, CloseHistory};
pub use events::{Event, EventRegistry};
pub use protocol::frame::{decode_frame, encode_frame, DecodedFrame, EncodedFrame, FrameError};
pub use protocol::header::FrameHeader;
