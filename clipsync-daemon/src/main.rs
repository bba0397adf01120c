//! # clipsyncd
//!
//! Background clipboard synchronization daemon.
//!
//! ## Commands
//!
//! - `run`: run the daemon (scheduler + clipboard watcher)
//! - `once`: run one manual sync attempt and exit
//! - `status`: show settings, server state and history size
//! - `history`: show the clipboard history
//!
//! ## Example
//!
//! ```bash
//! # One manual attempt against the configured server
//! clipsyncd once
//!
//! # Run in the background with a config file
//! clipsyncd run --config clipsync.toml
//!
//! # Demo mode against an in-process fake server
//! clipsyncd run --mock
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use clipsync_core::ContentGovernor;
use clipsync_engine::{
    Clipboard, HistoryStore, HttpTransport, JsonFileStore, MockTransport, SettingsStore,
    SyncExecutor, SyncScheduler, Transport, DEFAULT_ROUND_TRIP_TIMEOUT,
};
use clipsync_types::NetworkStatus;

mod clipboard;
mod config;
mod watcher;

use clipboard::SystemClipboard;
use config::{default_data_dir, DaemonConfig};

/// Background clipboard synchronization daemon.
#[derive(Parser, Debug)]
#[command(name = "clipsyncd")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory for persisted engine state
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use an in-process mock transport instead of HTTP (for testing/demo)
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the daemon (scheduler + clipboard watcher)
    Run,
    /// Run one manual sync attempt and exit
    Once,
    /// Show settings, server state and history size
    Status,
    /// Show the clipboard history
    History,
}

/// Loaded stores shared by every command.
struct Engine {
    config: DaemonConfig,
    settings: Arc<SettingsStore>,
    history: Arc<HistoryStore>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let engine = load_engine(&cli).await?;

    match cli.command {
        Commands::Run => {
            if cli.mock {
                run_daemon(engine, MockTransport::new(), SystemClipboard::new()).await
            } else {
                ensure_server_configured(&engine).await?;
                let transport = HttpTransport::new(DEFAULT_ROUND_TRIP_TIMEOUT)?;
                run_daemon(engine, transport, SystemClipboard::new()).await
            }
        }
        Commands::Once => {
            if cli.mock {
                sync_once(engine, MockTransport::new(), SystemClipboard::new()).await
            } else {
                ensure_server_configured(&engine).await?;
                let transport = HttpTransport::new(DEFAULT_ROUND_TRIP_TIMEOUT)?;
                sync_once(engine, transport, SystemClipboard::new()).await
            }
        }
        Commands::Status => show_status(engine).await,
        Commands::History => show_history(engine).await,
    }
}

/// Load config, open the persisted store, and apply config-file seeds.
async fn load_engine(cli: &Cli) -> Result<Engine> {
    let config = DaemonConfig::load(cli.config.as_deref())?;

    let data_dir = cli
        .data_dir
        .clone()
        .or_else(|| config.data_dir.clone())
        .or_else(default_data_dir)
        .context("could not determine a data directory")?;
    let store = Arc::new(
        JsonFileStore::open(data_dir.join("state.json"))
            .await
            .context("failed to open the state store")?,
    );

    let settings = Arc::new(SettingsStore::load(store.clone()).await?);

    // A changed endpoint in the config file counts as a user edit and
    // invalidates the observed connection flag.
    if let Some(server) = &config.server {
        let current = settings.server_config().await;
        if current.url != server.url
            || current.username != server.username
            || current.password != server.password
        {
            settings
                .set_server_endpoint(&server.url, &server.username, &server.password)
                .await?;
            tracing::info!(url = %server.url, "server endpoint updated from config file");
        }
    }
    if let Some(section) = &config.settings {
        let current = settings.settings().await;
        let merged = section.apply(current.clone());
        if merged != current {
            settings.update_settings(merged).await?;
        }
    }

    let capacity = settings.settings().await.clipboard_history_count;
    let history = Arc::new(HistoryStore::load(store, capacity, ContentGovernor::default()).await?);

    Ok(Engine {
        config,
        settings,
        history,
    })
}

async fn ensure_server_configured(engine: &Engine) -> Result<()> {
    if engine.settings.server_config().await.url.is_empty() {
        anyhow::bail!(
            "no server endpoint configured; set [server] in the config file or use --mock"
        );
    }
    Ok(())
}

async fn run_daemon<T, C>(engine: Engine, transport: T, clipboard: C) -> Result<()>
where
    T: Transport + 'static,
    C: Clipboard + Clone + 'static,
{
    let executor = Arc::new(SyncExecutor::new(
        transport,
        clipboard.clone(),
        engine.settings.clone(),
        engine.history.clone(),
    ));

    // No connectivity observer exists on this platform; the channel seam
    // stays in place so one can be wired in without touching the engine.
    let (network_tx, network_rx) = watch::channel(NetworkStatus::Available);

    let scheduler = Arc::new(SyncScheduler::new(
        executor,
        engine.settings.clone(),
        network_rx,
    ));
    let scheduler_handle = scheduler.spawn();
    let watcher_handle = watcher::spawn_clipboard_watcher(
        clipboard,
        engine.history.clone(),
        engine.settings.clone(),
        Duration::from_millis(engine.config.watcher.poll_interval_ms),
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("shutting down");
    scheduler_handle.abort();
    watcher_handle.abort();
    drop(network_tx);
    Ok(())
}

async fn sync_once<T, C>(engine: Engine, transport: T, clipboard: C) -> Result<()>
where
    T: Transport + 'static,
    C: Clipboard + 'static,
{
    let executor = SyncExecutor::new(
        transport,
        clipboard,
        engine.settings.clone(),
        engine.history.clone(),
    );
    let outcome = executor
        .sync_once()
        .await
        .context("sync attempt failed")?;
    println!("sync completed: {:?}", outcome);
    Ok(())
}

async fn show_status(engine: Engine) -> Result<()> {
    let settings = engine.settings.settings().await;
    let server = engine.settings.server_config().await;
    let url = if server.url.is_empty() {
        "(not configured)"
    } else {
        server.url.as_str()
    };

    println!("device:        {}", settings.device_name);
    println!(
        "auto sync:     {} (every {}s)",
        settings.auto_sync, settings.sync_interval_secs
    );
    println!("sync on boot:  {}", settings.sync_on_boot);
    println!("notifications: {}", settings.show_notifications);
    println!("history depth: {}", settings.clipboard_history_count);
    println!("server:        {}", url);
    println!("connected:     {}", server.is_connected);
    match server.last_sync_time_ms {
        Some(ts) => println!("last sync:     {} (unix ms)", ts),
        None => println!("last sync:     never"),
    }
    println!("history size:  {}", engine.history.len().await);
    Ok(())
}

async fn show_history(engine: Engine) -> Result<()> {
    let governor = ContentGovernor::default();
    let entries = engine.history.entries().await;
    if entries.is_empty() {
        println!("history is empty");
        return Ok(());
    }
    for entry in entries {
        let preview = governor.truncate_for_ui(&entry.content).replace('\n', " ");
        println!(
            "{}  {:>8}B  {:<6?}  {}  {}",
            entry.timestamp_ms, entry.size_bytes, entry.origin, entry.source_device, preview
        );
    }
    Ok(())
}
