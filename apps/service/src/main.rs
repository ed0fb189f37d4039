use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use sitewatch_service::config::Config;
use sitewatch_service::database::open_database;
use sitewatch_service::orchestrator::Orchestrator;

/// Polls registered websites and records their availability
#[derive(Parser, Debug)]
#[command(name = "sitewatch-service", version, about, long_about = None)]
struct Cli {
    /// Path of the config file (created with defaults when missing)
    #[arg(short, long, env = "SITEWATCH_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the database path from the config
    #[arg(short, long, env = "SITEWATCH_DATABASE", value_name = "FILE")]
    database: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the effective configuration and exit
    PrintConfig,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::from_config(cli.config.as_ref()).context("failed to load config")?;
    if let Some(database) = cli.database {
        config.database.path = database;
    }

    if let Some(Command::PrintConfig) = cli.command {
        println!("{config}");
        return Ok(());
    }

    logger::init_tracing_with(config.log_level(), Some(config.log_format()));
    info!(database = %config.database.path, "Starting sitewatch service");

    let pool = open_database(&config.database.path)
        .await
        .with_context(|| format!("failed to open database {}", config.database.path))?;

    let handle = Orchestrator::start(&config, pool).await?;

    tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
    info!("Received ctrl-c, stopping");

    handle.shutdown().await;
    Ok(())
}
