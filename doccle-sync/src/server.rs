//! Health endpoint and manual sync trigger.
//!
//! - `GET /health`: liveness plus the last run summary.
//! - `POST /sync`: runs one sync now; `409` if one is already running. The
//!   run continues even if the caller disconnects.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use doccle_sync_core::runner::{RunRecord, RunStatus, SyncRunner};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<SyncRunner>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(runner: Arc<SyncRunner>) -> Self {
        Self {
            runner,
            started_at: Instant::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub sync_in_progress: bool,
    pub last_run: Option<RunRecord>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        sync_in_progress: state.runner.is_running(),
        last_run: state.runner.last_run(),
    })
}

pub async fn trigger_sync(State(state): State<AppState>) -> Response {
    info!("[HTTP] Manual sync requested");
    // Runs to completion even if this request future is dropped.
    let runner = state.runner.clone();
    let run = match tokio::spawn(async move { runner.run_once().await }).await {
        Ok(run) => run,
        Err(e) => {
            error!(error = %e, "[HTTP] Manual sync task failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: e.to_string(),
                }),
            )
                .into_response();
        }
    };
    match run {
        Ok(RunStatus::Completed(_)) => match state.runner.last_run() {
            Some(record) => (StatusCode::OK, Json(record)).into_response(),
            None => StatusCode::OK.into_response(),
        },
        Ok(RunStatus::Skipped) => (
            StatusCode::CONFLICT,
            Json(ErrorBody {
                error: "sync already in progress".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "[HTTP] Manual sync failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/sync", post(trigger_sync))
        .with_state(state)
}

/// Binds `bind` and serves until the task is dropped.
pub async fn serve(bind: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind health server on {bind}: {e}"))?;
    info!(addr = %listener.local_addr()?, "[HTTP] Health server listening");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
