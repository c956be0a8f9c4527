//! FileDrop receiving hub: entry point.
//!
//! Accepts WebSocket connections from FileDrop clients and writes every
//! received file into an output directory.
//!
//! # Usage
//!
//! ```text
//! filedrop-server [OPTIONS]
//!
//! Options:
//!   --bind    <ADDR>   IP address to listen on [default: 0.0.0.0]
//!   --port    <PORT>   WebSocket listener port [default: 8080]
//!   --out-dir <DIR>    Where received files are written [default: out]
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable           | Default   | Description                 |
//! |--------------------|-----------|-----------------------------|
//! | `FILEDROP_BIND`    | `0.0.0.0` | Listener IP address         |
//! | `FILEDROP_PORT`    | `8080`    | Listener port               |
//! | `FILEDROP_OUT_DIR` | `out`     | Output directory            |
//! | `RUST_LOG`         | `info`    | `tracing` filter            |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use filedrop_server::domain::ServerConfig;
use filedrop_server::infrastructure::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// FileDrop receiving hub.
#[derive(Debug, Parser)]
#[command(
    name = "filedrop-server",
    about = "Receives files streamed by FileDrop clients over WebSocket",
    version
)]
struct Cli {
    /// IP address to bind the WebSocket server to.
    ///
    /// Use `0.0.0.0` to accept connections from any network interface, or
    /// `127.0.0.1` to accept only local connections.
    #[arg(long, default_value = "0.0.0.0", env = "FILEDROP_BIND")]
    bind: String,

    /// TCP port for the WebSocket server to listen on.
    #[arg(long, default_value_t = 8080, env = "FILEDROP_PORT")]
    port: u16,

    /// Directory received files are written to; created if missing.
    #[arg(long, default_value = "out", env = "FILEDROP_OUT_DIR")]
    out_dir: PathBuf,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--bind` is not a valid IP address.
    fn into_server_config(self) -> anyhow::Result<ServerConfig> {
        let bind_addr: SocketAddr = format!("{}:{}", self.bind, self.port)
            .parse()
            .with_context(|| format!("invalid bind address: '{}:{}'", self.bind, self.port))?;

        Ok(ServerConfig {
            bind_addr,
            out_dir: self.out_dir,
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_server_config()?;

    info!(
        "FileDrop hub starting: bind={}, out_dir={}",
        config.bind_addr,
        config.out_dir.display()
    );

    // The accept loop checks this flag every 200 ms.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, initiating graceful shutdown");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    run_server(config, running).await?;

    info!("FileDrop hub stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
