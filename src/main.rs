mod database;
mod utils;
mod web;

use std::path::PathBuf;
use anyhow::{Result, Context};
use clap::Parser;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;

use crate::database::Gateway;
use crate::utils::config::{AppConfig, Overrides};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long)]
    host: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,

    #[arg(short, long)]
    db_path: Option<PathBuf>,

    #[arg(long)]
    public_dir: Option<PathBuf>,

    /// Keep existing rows instead of rebuilding the tables from the seed set
    #[arg(long)]
    no_reseed: bool,

    /// Settings file read for anything not given on the command line
    #[arg(long, default_value = "dental.env")]
    env_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let cfg = AppConfig::resolve(
        Overrides {
            host: args.host,
            port: args.port,
            db_path: args.db_path,
            public_dir: args.public_dir,
            no_reseed: args.no_reseed,
        },
        &args.env_file,
    )?;
    let addr = cfg.socket_addr()?;

    info!("Dental clinic starting...");
    info!("DB: {:?} (reseed: {})", cfg.db_path, cfg.reseed);
    info!("Public files: {:?}", cfg.public_dir);

    let store = Gateway::open(&cfg.store_options()).context("Failed to initialize the store")?;

    web::run_server(addr, store, &cfg.public_dir, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
