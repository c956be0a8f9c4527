//! filedrop-server library crate.
//!
//! The receiving hub: accepts WebSocket sessions from FileDrop clients and
//! writes the payload of every binary frame it receives to an output
//! directory, under the file name carried in the frame header.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! filedrop-client (binary frames over WebSocket)
//!         ↕
//! [filedrop-server]
//!   ├── domain/           ServerConfig
//!   ├── application/      Frame → file on disk (decode, sanitise name, write)
//!   └── infrastructure/
//!         └── ws_server/  WebSocket accept loop (tokio-tungstenite)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no external dependencies (no I/O, no async, no frameworks).
//! - `application` depends on `domain` and `filedrop-core` only.
//! - `infrastructure` depends on all other layers plus `tokio` and `tungstenite`.

/// Domain layer: configuration types (no I/O).
pub mod domain;

/// Application layer: storing received frames.
pub mod application;

/// Infrastructure layer: WebSocket server.
pub mod infrastructure;
