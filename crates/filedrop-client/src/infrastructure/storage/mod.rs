//! Persistent storage for the client: the TOML configuration file.

pub mod config;
