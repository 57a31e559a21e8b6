//! riskflagd - HTTP trigger daemon
//!
//! Listens on `0.0.0.0:$PORT` (default 8080) and runs the audit pipeline in
//! the background whenever an event is POSTed.

mod server;

use anyhow::{Context, Result};
use riskflag_core::RiskflagConfig;
use std::net::SocketAddr;
use tracing::{info, Level};

const DEFAULT_PORT: u16 = 8080;

/// `RISKFLAG_LOG_FORMAT=json` switches to JSON log lines.
const ENV_LOG_FORMAT: &str = "RISKFLAG_LOG_FORMAT";

fn listen_port(raw: Option<&str>) -> Result<u16> {
    match raw.map(str::trim).filter(|p| !p.is_empty()) {
        Some(port) => port
            .parse()
            .with_context(|| format!("PORT is not a valid port number: {port}")),
        None => Ok(DEFAULT_PORT),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json = std::env::var(ENV_LOG_FORMAT)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    riskflag_core::telemetry::init_tracing(json, Level::INFO);

    let port = listen_port(std::env::var("PORT").ok().as_deref())?;
    let config = RiskflagConfig::from_env();
    info!(input = %config.input, output = %config.output_path.display(), "riskflagd configured");

    let app = server::router(server::AppState::from_config(config));
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(%addr, "riskflagd listening");
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
