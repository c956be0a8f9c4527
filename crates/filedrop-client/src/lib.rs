//! filedrop-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does filedrop-client do? (for beginners)
//!
//! The client is the side the user drops files onto.  Every dropped file is
//! packed into one binary frame (a small JSON header followed by the raw
//! bytes) and sent over a WebSocket to the receiving hub.
//!
//! The client application:
//!
//! 1. Keeps one WebSocket connection to the hub open, reconnecting with a
//!    growing delay when it keeps closing.
//! 2. Accepts dropped files and queues them for encoding.
//! 3. Encodes the queue one file at a time, in drop order, skipping files
//!    that fail.
//! 4. Sends each encoded frame on the currently open connection.
//!
//! The pieces never call each other directly.  Each one publishes events on
//! its own `EventRegistry`, and [`app::FileDropApp`] subscribes them to each
//! other.

/// Application layer: use cases for the client.
pub mod application;

/// Infrastructure layer: drop zone, transport, status board, and config.
pub mod infrastructure;

/// Composition root wiring the components together.
pub mod app;
