//! songshift - playlist transfer between music catalogs
//!
//! Reads the authenticated user's Spotify playlists, matches their tracks on
//! YouTube with batched searches, and creates matching YouTube playlists.

use anyhow::{Context, Result};
use clap::Parser;
use songshift::config::{CliOverrides, Settings};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for songshift
#[derive(Parser, Debug)]
#[command(name = "songshift")]
#[command(about = "Transfer Spotify playlists to YouTube")]
#[command(version)]
struct Args {
    /// TOML configuration file (default: ~/.config/songshift/config.toml)
    #[arg(short, long, env = "SONGSHIFT_CONFIG")]
    config: Option<PathBuf>,

    /// Tracks per destination search query
    #[arg(long)]
    search_batch_size: Option<usize>,

    /// Item ids per grouped destination insert
    #[arg(long)]
    upload_batch_size: Option<usize>,

    /// Fixed delay after each external batch call, in milliseconds
    #[arg(long)]
    pacing_ms: Option<u64>,

    /// Only transfer the named playlist (repeatable)
    #[arg(short, long = "playlist")]
    playlists: Vec<String>,

    /// Read and match only; create and write nothing
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl From<&Args> for CliOverrides {
    fn from(args: &Args) -> Self {
        Self {
            search_batch_size: args.search_batch_size,
            upload_batch_size: args.upload_batch_size,
            pacing_ms: args.pacing_ms,
            playlists: args.playlists.clone(),
            dry_run: args.dry_run,
            log_level: args.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (toml_config, config_file) =
        songshift_common::config::resolve_toml_config(args.config.as_deref())?;
    let settings = Settings::resolve(&CliOverrides::from(&args), &toml_config)?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("songshift={}", settings.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting songshift {}", env!("CARGO_PKG_VERSION"));
    match &config_file {
        Some(path) => info!("Configuration loaded from {}", path.display()),
        None => info!("No config file found, using built-in defaults"),
    }
    info!(
        search_batch_size = settings.search_batch_size,
        upload_batch_size = settings.upload_batch_size,
        pacing_ms = settings.pacing.as_millis() as u64,
        dry_run = settings.dry_run,
        "Transfer settings resolved"
    );

    // Both sessions must exist before any playlist is touched
    let source = songshift::auth::connect_spotify(&settings.spotify, &settings.session)
        .await
        .map_err(|e| {
            error!("Exiting due to Spotify authentication failure: {}", e);
            e
        })
        .context("Spotify session")?;
    let destination = songshift::auth::connect_youtube(&settings.youtube, &settings.session)
        .await
        .map_err(|e| {
            error!("Exiting due to YouTube authentication failure: {}", e);
            e
        })
        .context("YouTube session")?;

    let orchestrator =
        songshift::build_orchestrator(Arc::new(source), Arc::new(destination), &settings);

    let summary = orchestrator
        .run()
        .await
        .context("Failed to list source playlists")?;

    info!("Transfer complete");
    println!("\n--- Transfer Summary ---");
    println!("{}", summary);

    Ok(())
}
