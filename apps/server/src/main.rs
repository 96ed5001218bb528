#![warn(clippy::all, clippy::pedantic)]

use std::net::SocketAddr;
use std::path::PathBuf;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use anyhow::Context;
use clap::Parser;
use tracing::info;

mod config;
mod error;
mod routes;
mod state;

use config::Config;
use error::AppError;
use logger::init_tracing;
use state::AppState;
use tcpingmap::CycleOutcome;

/// TCP connect latency prober with an HTTP results endpoint
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the TOML config, created with defaults when missing
    #[arg(short, long, env = "TCPINGMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind the HTTP server to
    #[arg(long)]
    bind: Option<String>,

    /// Port to bind the HTTP server to
    #[arg(short, long)]
    port: Option<u16>,

    /// Run a single cycle, print the snapshot and exit
    #[arg(long)]
    once: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(bind) = &self.bind {
            config.server.bind.clone_from(bind);
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let mut config =
        Config::from_config(cli.config.as_ref()).context("failed to load configuration")?;
    cli.apply(&mut config);
    info!("{config}");

    let (state, driver) = state::build(&config).context("failed to set up the prober")?;

    if cli.once {
        match driver.run_once().await {
            CycleOutcome::Published { .. } => {
                let snapshot = state.store.read().unwrap_or_default();
                println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?);
            }
            CycleOutcome::Skipped(reason) => info!("Nothing to print: {reason}"),
        }
        return Ok(());
    }

    tokio::spawn(driver.run());

    run_server(&config, state).await?;
    Ok(())
}

async fn run_server(config: &Config, state: AppState) -> Result<(), AppError> {
    let addr: SocketAddr = config.socket_addr()?;
    let state = web::Data::new(state);
    info!("Serving results on http://{addr}");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST"])
            .allow_any_header()
            .max_age(3600);

        App::new().wrap(cors).app_data(state.clone()).configure(routes::routes)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}
