//! # Tannoy — Rule-Based Notification Engine
//!
//! Ingests business events over HTTP, matches them against configured
//! rules, and fans notifications out to Telegram, Discord, and Slack.
//!
//! Usage:
//!   tannoy                          # Start with ~/.tannoy/config.toml
//!   tannoy --port 9000              # Custom gateway port
//!   tannoy --config ./tannoy.toml   # Explicit config file

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use tannoy_channels::ChannelRouter;
use tannoy_core::TannoyConfig;
use tannoy_engine::{BuiltinTemplates, NotificationEngine, SqliteStore, spawn_engine};
use tannoy_gateway::AppState;

#[derive(Parser)]
#[command(
    name = "tannoy",
    version,
    about = "📣 Tannoy — Rule-Based Notification Engine"
)]
struct Cli {
    /// Path to config file (default: ~/.tannoy/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Gateway port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Engine tick interval in seconds (overrides config)
    #[arg(long)]
    tick: Option<u64>,

    /// Database path (overrides config)
    #[arg(long)]
    db: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn expand_path(p: &str) -> String {
    shellexpand::tilde(p).to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "tannoy=debug,tannoy_core=debug,tannoy_engine=debug,tannoy_channels=debug,tannoy_gateway=debug,tower_http=debug"
    } else {
        "tannoy=info,tannoy_core=info,tannoy_engine=info,tannoy_channels=info,tannoy_gateway=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    // Load config, then apply CLI overrides
    let mut config = match &cli.config {
        Some(path) => TannoyConfig::load_from(std::path::Path::new(&expand_path(path)))?,
        None => TannoyConfig::load()?,
    };
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }
    if let Some(tick) = cli.tick {
        config.engine.tick_interval_secs = tick;
    }
    if let Some(db) = cli.db {
        config.engine.db_path = db;
    }

    // Storage and delivery channels
    let db_path = expand_path(&config.engine.db_path);
    let store = Arc::new(SqliteStore::open(std::path::Path::new(&db_path))?);

    let router = ChannelRouter::from_config(&config.channel);
    let channels = router.configured();
    if channels.is_empty() {
        tracing::warn!(
            "⚠️ No delivery channels configured — dispatches will fail until one is enabled"
        );
    }

    // Engine + background drain loop
    let engine = Arc::new(NotificationEngine::new(
        store,
        Arc::new(router),
        Arc::new(BuiltinTemplates),
    )?);
    let engine_task = spawn_engine(engine.clone(), config.engine.tick_interval_secs);

    println!("📣 Tannoy v{}", env!("CARGO_PKG_VERSION"));
    println!(
        "   🌐 Gateway:  http://{}:{}",
        config.gateway.host, config.gateway.port
    );
    println!("   🗄️  Database: {db_path}");
    println!("   ⏱️  Tick:     {}s", config.engine.tick_interval_secs);
    println!("   📡 Channels: {channels:?}");
    println!();

    // Serve until Ctrl-C, then settle the engine before exit
    let state = AppState {
        engine: engine.clone(),
        channels,
        start_time: std::time::Instant::now(),
    };
    tannoy_gateway::server::start(&config.gateway, state).await?;

    engine.shutdown().await;
    engine_task.await?;

    tracing::info!("👋 Tannoy stopped");
    Ok(())
}
