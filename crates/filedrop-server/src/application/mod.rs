//! Application layer for filedrop-server.
//!
//! # What does this layer do?
//!
//! - **`receive_file`** – Decodes one frame, turns the header's file name
//!   into a safe path inside the output directory, and writes the payload
//!   there.  The WebSocket layer calls it once per binary message and only
//!   logs the outcome, so one bad frame never ends a session.

pub mod receive_file;

pub use receive_file::{store_frame, stored_path, ReceiveError, StoredFile};
