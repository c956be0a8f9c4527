//! Application layer use cases for the client application.
//!
//! # What use cases does the client have?
//!
//! - **`encode_files`** – Takes the files the user dropped, reads each one
//!   and wraps it into a binary frame, strictly one file at a time and in
//!   drop order.  Where the file bytes come from is decided by a
//!   `DroppedFile` implementation that is injected by the caller, so the use
//!   case can be tested without touching the disk.
//!
//! Sending the frames is *not* part of this layer: the encoder publishes
//! `FileEncoded` events and the composition root forwards them to the
//! transport.

pub mod encode_files;
