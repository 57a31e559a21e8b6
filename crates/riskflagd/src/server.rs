//! HTTP trigger surface.
//!
//! `POST /` and `POST /process` start an audit run in the background and
//! answer immediately; `GET /health` is the liveness probe.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use riskflag_core::{AuditPipeline, LogSink, RiskflagConfig};
use riskflag_gcp::GeneratorFactory;
use serde::Serialize;
use tracing::{error, info};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RiskflagConfig>,
    pub factory: Arc<dyn GeneratorFactory>,
}

impl AppState {
    /// State whose generator is the Vertex client described by `config`.
    pub fn from_config(config: RiskflagConfig) -> Self {
        let factory: Arc<dyn GeneratorFactory> = Arc::new(config.vertex.clone());
        Self {
            config: Arc::new(config),
            factory,
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct TriggerResponse {
    status: &'static str,
    message: &'static str,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(trigger))
        .route("/process", post(trigger))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn trigger(State(state): State<AppState>) -> Json<TriggerResponse> {
    info!(input = %state.config.input, "Audit trigger received. Starting pipeline...");

    tokio::spawn(async move {
        let mut sink = LogSink;
        match AuditPipeline::run(&state.config, state.factory.as_ref(), &mut sink).await {
            Ok(summary) => info!(
                run_id = %summary.run_id,
                flagged = summary.flagged,
                "Background audit finished"
            ),
            Err(e) => error!(error = %e, "Background audit failed"),
        }
    });

    Json(TriggerResponse {
        status: "Processing started",
        message: "Audit is running in background",
    })
}
