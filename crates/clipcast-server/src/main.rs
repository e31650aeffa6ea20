//! ClipCast broadcast engine entry point.
//!
//! This binary captures the local text selection on a hotkey and relays
//! it to every connected peer over a compact TCP framing. Peers can push
//! text back, and a second hotkey pastes the latest received text
//! locally.
//!
//! # Usage
//!
//! ```text
//! clipcast-server [OPTIONS]
//!
//! Options:
//!   --config      <PATH>  Config file location [default: platform config dir]
//!   --port        <PORT>  TCP port peers connect to [default: 9998]
//!   --bind        <ADDR>  Listener bind address [default: 0.0.0.0]
//!   --archive-dir <PATH>  Archive each capture into this directory
//!   --no-signal-triggers  Disable the SIGUSR1/SIGUSR2 hotkey triggers
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable               | Description                         |
//! |------------------------|-------------------------------------|
//! | `CLIPCAST_CONFIG`      | Config file location                |
//! | `CLIPCAST_PORT`        | TCP listener port                   |
//! | `CLIPCAST_BIND`        | Listener bind address               |
//! | `CLIPCAST_ARCHIVE_DIR` | Capture archive directory           |
//! | `RUST_LOG`             | Log filter (beats `log_level` from the config file) |
//!
//! # Hotkeys
//!
//! The engine itself registers no global hotkeys. It listens for Unix
//! signals instead, so any keybinding daemon (sxhkd, your DE's shortcut
//! settings, a window manager binding) drives it with one-liners:
//!
//! ```text
//! kill -USR1 $(pidof clipcast-server)   # capture the current selection
//! kill -USR2 $(pidof clipcast-server)   # paste the latest received text
//! ```
//!
//! # Architecture overview
//!
//! ```text
//! hotkey daemon ──SIGUSR1/2──▶ clipcast-server ◀──TCP :9998──▶ peers
//!                                application/     capture worker, hotkey
//!                                                 pump, paste buffer
//!                                infrastructure/  listener + sessions,
//!                                                 signals, clipboard,
//!                                                 config + archive
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use clipcast_server::application::capture::{CaptureSink, SelectionSource};
use clipcast_server::application::hotkeys::PasteInjector;
use clipcast_server::infrastructure::clipboard::SystemClipboard;
use clipcast_server::infrastructure::hotkey::HotkeySource;
use clipcast_server::infrastructure::storage::archive::FileCaptureSink;
use clipcast_server::infrastructure::storage::config::{load_config, load_config_from, AppConfig};
use clipcast_server::service::ClipCastServer;

// ── CLI argument definitions ────────────────────────────────────────────────

/// ClipCast broadcast engine.
///
/// Captures the local text selection on a hotkey signal and relays it to
/// every connected TCP peer; peers push text back for local pasting.
#[derive(Debug, Parser)]
#[command(
    name = "clipcast-server",
    about = "Hotkey-triggered text capture and broadcast engine",
    version
)]
struct Cli {
    /// Path to the TOML config file.
    ///
    /// Defaults to the platform config location, e.g.
    /// `~/.config/clipcast/config.toml` on Linux.
    #[arg(long, env = "CLIPCAST_CONFIG")]
    config: Option<PathBuf>,

    /// TCP port peers connect to. Overrides the config file.
    #[arg(long, env = "CLIPCAST_PORT")]
    port: Option<u16>,

    /// IP address to bind the listener to. Overrides the config file.
    ///
    /// Use `0.0.0.0` to accept peers from any interface, or `127.0.0.1`
    /// for local-only testing.
    #[arg(long, env = "CLIPCAST_BIND")]
    bind: Option<String>,

    /// Archive each capture into this directory as `capture_<n>.txt`.
    /// Overrides the config file.
    #[arg(long, env = "CLIPCAST_ARCHIVE_DIR")]
    archive_dir: Option<PathBuf>,

    /// Disable the SIGUSR1/SIGUSR2 hotkey triggers.
    ///
    /// The engine then only relays text pushed by peers; captures can
    /// still be driven programmatically when embedding the library.
    #[arg(long)]
    no_signal_triggers: bool,
}

impl Cli {
    /// Applies the command-line overrides on top of the loaded config.
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(port) = self.port {
            config.network.port = port;
        }
        if let Some(bind) = &self.bind {
            config.network.bind_address = bind.clone();
        }
        if let Some(dir) = &self.archive_dir {
            config.server.archive_dir = Some(dir.clone());
        }
        if self.no_signal_triggers {
            config.capture.signal_triggers = false;
        }
    }
}

// ── Collaborator selection ──────────────────────────────────────────────────

/// Picks the hotkey source for this platform and configuration.
fn build_hotkey_source(config: &AppConfig) -> Option<Arc<dyn HotkeySource>> {
    if !config.capture.signal_triggers {
        info!("signal triggers disabled; running relay-only");
        return None;
    }

    #[cfg(unix)]
    {
        use clipcast_server::infrastructure::hotkey::signals::SignalHotkeySource;
        Some(Arc::new(SignalHotkeySource::new()) as Arc<dyn HotkeySource>)
    }

    #[cfg(not(unix))]
    {
        tracing::warn!("signal triggers are not available on this platform; running relay-only");
        None
    }
}

// ── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Config must load before logging init because the config file
    // carries the default log level.
    let mut config = match &cli.config {
        Some(path) => load_config_from(path.clone())
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => load_config().context("failed to load config")?,
    };
    cli.apply_overrides(&mut config);

    // `RUST_LOG` wins, then the configured level, then "info".
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::try_new(&config.server.log_level)
                .unwrap_or_else(|_| EnvFilter::new("info"))
        }))
        .init();

    info!("ClipCast engine starting");

    let listen_addr = config
        .network
        .listen_addr()
        .with_context(|| format!("invalid bind address '{}'", config.network.bind_address))?;

    // ── Collaborators ─────────────────────────────────────────────────────
    //
    // One SystemClipboard serves both clipboard-facing seams.
    let clipboard = Arc::new(SystemClipboard::new(config.capture.selection_timeout()));

    let sink = match &config.server.archive_dir {
        Some(dir) => {
            let sink = FileCaptureSink::new(dir.clone())
                .with_context(|| format!("failed to prepare archive directory {}", dir.display()))?;
            info!("archiving captures to {}", dir.display());
            Some(Arc::new(sink) as Arc<dyn CaptureSink>)
        }
        None => None,
    };

    let hotkey_source = build_hotkey_source(&config);

    let mut server = ClipCastServer::new(
        listen_addr,
        hotkey_source,
        Arc::clone(&clipboard) as Arc<dyn SelectionSource>,
        clipboard as Arc<dyn PasteInjector>,
        sink,
    );

    let addr = server.run().await?;
    info!("ClipCast engine ready on {addr}. Press Ctrl-C to exit.");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("shutdown signal received");
    server.shutdown().await;

    info!("ClipCast engine stopped");
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────────────
