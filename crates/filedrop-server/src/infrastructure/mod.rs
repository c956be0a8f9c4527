//! Infrastructure layer for filedrop-server.
//!
//! - **`ws_server`** – Binds the listener, accepts WebSocket sessions, and
//!   hands every binary message to the application layer.

pub mod ws_server;

pub use ws_server::{bind, run_server, serve};
