#![warn(clippy::all, clippy::pedantic)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use clap::Parser;
use sitewatch_service::config::Config;
use sitewatch_service::database::{DatabaseImpl, open_database};
use tracing::info;

mod error;
mod owner;
mod routes;
mod state;

use error::{AppError, json_config};
use state::AppState;

/// HTTP API for managing monitored websites
#[derive(Parser, Debug)]
#[command(name = "sitewatch-server", version, about, long_about = None)]
struct Cli {
    /// Path of the config file shared with the monitoring service
    #[arg(short, long, env = "SITEWATCH_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the database path from the config
    #[arg(short, long, env = "SITEWATCH_DATABASE", value_name = "FILE")]
    database: Option<String>,
}

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::from_config(cli.config.as_ref())?;
    if let Some(database) = cli.database {
        config.database.path = database;
    }

    logger::init_tracing_with(config.log_level(), Some(config.log_format()));

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let pool = open_database(&config.database.path).await?;
    let state = AppState::new(Arc::new(DatabaseImpl::new_from_pool(pool)), config.server.allow_private_targets);

    run_server(addr, state).await
}

async fn run_server(addr: SocketAddr, state: AppState) -> Result<(), AppError> {
    info!(%addr, "Starting HTTP server");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(json_config())
            .configure(routes::routes)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}
