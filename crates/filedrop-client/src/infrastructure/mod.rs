//! Infrastructure layer for the client application.
//!
//! Contains the outward-facing adapters: the drop zone the user interacts
//! with, the WebSocket transport, the status board and the config file.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `filedrop_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`drop_zone`** – Turns drag gestures into events and supplies the two
//!   `DroppedFile` implementations: `DiskFile` (a path) and `MemoryFile`
//!   (bytes already in memory).
//!
//! - **`transport`** – WebSocket client that connects to the hub, sends
//!   frames on whichever socket is currently open, and reconnects with a
//!   time-windowed linear backoff when the socket closes.
//!
//! - **`status`** – Folds events from every component into one snapshot for
//!   display.
//!
//! - **`storage`** – Loads and saves the TOML configuration file.

pub mod drop_zone;
pub mod status;
pub mod storage;
pub mod transport;
