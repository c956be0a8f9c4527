//! Hub configuration types.
//!
//! [`ServerConfig`] is the single source of truth for all runtime settings.
//! It is built from CLI arguments in `main.rs`, or from the defaults in
//! tests and local development.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Default listener port.
pub const DEFAULT_PORT: u16 = 8080;

/// All runtime configuration for the receiving hub.
///
/// # Example
///
/// ```rust
/// use filedrop_server::domain::ServerConfig;
///
/// let cfg = ServerConfig::default();
/// assert_eq!(cfg.bind_addr.port(), 8080);
/// assert_eq!(cfg.out_dir.to_str(), Some("out"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// The address and port the WebSocket server binds to.
    ///
    /// `0.0.0.0` accepts connections from any network interface.
    pub bind_addr: SocketAddr,

    /// Directory received files are written to.  Created on startup.
    pub out_dir: PathBuf,
}

impl Default for ServerConfig {
    /// | Field     | Default        |
    /// |-----------|----------------|
    /// | bind_addr | `0.0.0.0:8080` |
    /// | out_dir   | `out`          |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            out_dir: PathBuf::from("out"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
