//! folio command-line interface.
//!
//! Drives the same worker the MCP server exposes, one event per invocation.
//! Cache storage persists in the configured SQLite database between runs.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use folio_client::{FetchClient, FetchConfig, Worker};
use folio_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Command;

/// Offline-first portfolio worker.
#[derive(Debug, Parser)]
#[command(name = "folio", version, about, long_about = None)]
pub struct Cli {
    /// TOML config file layered under FOLIO_SW_* environment variables
    #[arg(long, global = true, env = "FOLIO_SW_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Cache storage database, overriding the configured path
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Log to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level(cli.verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = AppConfig::load_with(cli.config.as_deref()).context("loading configuration")?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("opening {}", config.db_path.display()))?;
    let network = FetchClient::new(FetchConfig::from_app(&config, config.origin_url()?))?;
    let worker = Worker::new(&config, db, Arc::new(network))?;

    let output = commands::run(&worker, cli.command).await;
    worker.settle().await;
    println!("{}", serde_json::to_string_pretty(&output?)?);

    Ok(())
}
