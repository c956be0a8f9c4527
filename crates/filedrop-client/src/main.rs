//! FileDrop client entry point.
//!
//! Connects to the hub, drops the files named on the command line (and,
//! with `--stdin`, one path per line read from standard input), waits until
//! every file has been encoded and sent, then exits.
//!
//! # Usage
//!
//! ```text
//! filedrop-client [OPTIONS] [FILES]...
//!
//! Options:
//!   --url <URL>        WebSocket URL of the hub [default: from config, else ws://localhost:8080/hub]
//!   --config <PATH>    Config file [default: platform config dir]
//!   --stdin            Also read paths from standard input, one per line
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable          | Description                                |
//! |-------------------|--------------------------------------------|
//! | `FILEDROP_URL`    | Hub URL, overrides the config file         |
//! | `FILEDROP_CONFIG` | Path of the TOML config file               |
//! | `RUST_LOG`        | `tracing` filter, overrides `[logging]`    |
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ FileDropApp::new()       -- drop zone, encoder, transport, status board
//!  └─ FileDropApp::start()     -- WebSocket reconnect loop
//!  └─ drop_zone.drop_paths()   -- files from argv / stdin
//!  └─ FileDropApp::wait_idle() -- encoder drained, frames written
//! ```

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use filedrop_client::app::FileDropApp;
use filedrop_client::infrastructure::storage::config::{self, ClientConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// FileDrop client.
///
/// Streams files to a FileDrop hub over a self-healing WebSocket.
#[derive(Debug, Parser)]
#[command(
    name = "filedrop-client",
    about = "Streams dropped files to a FileDrop hub over WebSocket",
    version
)]
struct Cli {
    /// WebSocket URL of the hub, e.g. `ws://192.168.1.10:8080/hub`.
    #[arg(long, env = "FILEDROP_URL")]
    url: Option<String>,

    /// Path of the TOML config file.
    #[arg(long, env = "FILEDROP_CONFIG")]
    config: Option<PathBuf>,

    /// Read additional paths from standard input, one per line.
    #[arg(long)]
    stdin: bool,

    /// Files to send, in order.
    files: Vec<PathBuf>,
}

impl Cli {
    /// Loads the config file and applies command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed.  A missing file yields the defaults.
    fn load_config(&self) -> anyhow::Result<ClientConfig> {
        let mut cfg = match &self.config {
            Some(path) => config::load_config(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => match config::config_file_path() {
                Ok(path) => config::load_config(&path)
                    .with_context(|| format!("failed to load config from {}", path.display()))?,
                Err(_) => ClientConfig::default(),
            },
        };
        if let Some(url) = &self.url {
            cfg.transport.url = url.clone();
        }
        Ok(cfg)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = cli.load_config()?;

    // `RUST_LOG` wins over the config file's level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.logging.level)),
        )
        .init();

    info!("FileDrop client starting; hub is {}", cfg.transport.url);

    let running = Arc::new(AtomicBool::new(true));
    let app = FileDropApp::new(cfg.transport.to_transport_config());
    let connection = app.start(Arc::clone(&running));

    let work = async {
        app.transport.wait_open().await;

        if !cli.files.is_empty() {
            app.drop_zone.drop_paths(cli.files.iter().cloned()).await;
        }

        if cli.stdin {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
                let line = line.trim();
                if !line.is_empty() {
                    app.drop_zone.drop_paths([PathBuf::from(line)]).await;
                }
            }
        }

        app.wait_idle().await;
        anyhow::Ok(())
    };

    tokio::select! {
        result = work => result?,
        _ = tokio::signal::ctrl_c() => warn!("interrupted; unsent files are abandoned"),
    }

    running.store(false, Ordering::Relaxed);
    connection.abort();

    let snap = app.status.snapshot();
    info!(
        "FileDrop client stopped: {} encoded, {} sent, {} unsent, {} failed",
        snap.files_encoded, snap.files_sent, snap.files_unsent, snap.files_failed
    );
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["filedrop-client"]);

        assert!(cli.url.is_none() || std::env::var("FILEDROP_URL").is_ok());
        assert!(!cli.stdin);
        assert!(cli.files.is_empty());
    }

    #[test]
    fn test_cli_files_keep_their_order() {
        let cli = Cli::parse_from(["filedrop-client", "b.txt", "a.txt", "--stdin"]);

        assert_eq!(cli.files, vec![PathBuf::from("b.txt"), PathBuf::from("a.txt")]);
        assert!(cli.stdin);
    }

    #[test]
    fn test_url_flag_overrides_config_file() {
        // Arrange: a config path that does not exist yields the defaults
        let missing = std::env::temp_dir().join("filedrop-client-test-missing.toml");
        let cli = Cli::parse_from([
            "filedrop-client",
            "--url",
            "ws://10.1.2.3:9000/hub",
            "--config",
            missing.to_str().unwrap(),
        ]);

        // Act
        let cfg = cli.load_config().unwrap();

        // Assert
        assert_eq!(cfg.transport.url, "ws://10.1.2.3:9000/hub");
        assert_eq!(cfg.transport.base_unit_ms, 600);
    }
}
