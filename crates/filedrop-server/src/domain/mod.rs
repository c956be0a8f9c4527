//! Domain layer for filedrop-server.
//!
//! Holds the runtime configuration only; everything that touches sockets or
//! files lives in the outer layers.

pub mod config;

pub use config::ServerConfig;
