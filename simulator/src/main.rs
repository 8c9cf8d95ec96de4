use anyhow::Context;
use clap::Parser;
use clickfarm_simulator::{unix_now, Api, Config, Simulator};
use std::{path::PathBuf, sync::Arc};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration with the admin key and genesis tables
    #[arg(short, long)]
    config: PathBuf,

    /// Overrides the configured port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse args
    let args = Args::parse();

    // Load config
    let raw = std::fs::read_to_string(&args.config)
        .with_context(|| format!("failed to read {}", args.config.display()))?;
    let config: Config = serde_yaml::from_str(&raw).context("failed to parse config")?;
    let config = config.validate().context("invalid config")?;

    // Create logger
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    let simulator = Arc::new(Simulator::new(&config, unix_now()).context("genesis failed")?);
    info!(authority = ?config.authority, "simulator ready");
    let api = Api::new(simulator);
    let app = api.router();

    // Start server
    let port = args.port.unwrap_or(config.port);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on {}", addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .context("axum server error")?;

    Ok(())
}
