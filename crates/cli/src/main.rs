mod cli;
mod commands;
mod document;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trackbabel_core::{
    load_config, load_config_from_env, validate_config, Config, ConversionOrchestrator, Engine,
    HttpDownloader, Stager,
};

use cli::Cli;
use commands::Orchestrator;
use document::PassThroughCodec;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = resolve_config(cli.config.clone())?;
    validate_config(&config).context("Configuration validation failed")?;

    let engine = Arc::new(Engine::initialize(&config.engine).await);
    if !engine.is_available() {
        warn!("gpsbabel is not available; only shell commands and native downloads will work");
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, stopping conversion");
            on_interrupt.cancel();
        }
    });

    let orchestrator: Orchestrator = ConversionOrchestrator::new(
        engine,
        Arc::new(PassThroughCodec),
        Arc::new(HttpDownloader::new(config.download.clone())),
        Stager::new(&config.staging),
    )
    .with_cancellation(cancel);

    commands::execute(&orchestrator, &config, cli.command, cli.json).await
}

/// Loads the configuration named on the command line or by `TRACKBABEL_CONFIG`.
///
/// Without either, `trackbabel.toml` in the working directory is used if it
/// exists, and built-in defaults (plus environment overrides) otherwise.
fn resolve_config(explicit: Option<PathBuf>) -> Result<Config> {
    let named = explicit.or_else(|| std::env::var("TRACKBABEL_CONFIG").ok().map(PathBuf::from));
    if let Some(path) = named {
        info!("Loading configuration from {:?}", path);
        return load_config(&path)
            .with_context(|| format!("Failed to load config from {:?}", path));
    }

    let default_path = PathBuf::from("trackbabel.toml");
    if default_path.exists() {
        info!("Loading configuration from {:?}", default_path);
        return load_config(&default_path)
            .with_context(|| format!("Failed to load config from {:?}", default_path));
    }

    load_config_from_env().context("Failed to load configuration from environment")
}
