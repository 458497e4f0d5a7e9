use anyhow::Context;
use envconfig::Envconfig;
use leafcheck::config::Config;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::init_from_env().context("Failed to load config")?;

    let missing = config.missing();
    if !missing.is_empty() {
        warn!("Missing configuration: {}", missing.join(", "));
    }

    let listen_address: SocketAddr = config
        .listen_address
        .parse()
        .context("Invalid listen address")?;

    let pipeline = leafcheck::pipeline_from_config(&config)?;
    let app = leafcheck::router(Arc::new(pipeline), Arc::new(config));

    let listener = TcpListener::bind(listen_address)
        .await
        .with_context(|| format!("Could not bind to {listen_address}"))?;

    info!("Listening on {listen_address}");

    axum::serve(listener, app).await?;

    Ok(())
}
