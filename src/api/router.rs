//! Analysis API router.
//!
//! A thin transport wrapper around [`Analyzer::analyze`]: one analysis
//! endpoint plus a health probe, returned as a composable `Router` that
//! can be mounted on any axum server.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::error::ApiError;
use crate::api::types::{AnalyzeRequest, AnalyzeResponse, HealthResponse};
use crate::config;
use crate::core_state::CoreState;

/// Build the analysis API router.
pub fn analysis_router(state: Arc<CoreState>) -> Router {
    Router::new()
        .route("/api/analyze", post(analyze))
        .route("/api/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// `POST /api/analyze` — analyze a conversation transcript.
async fn analyze(
    State(state): State<Arc<CoreState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    if request.conversation.trim().is_empty() {
        return Err(ApiError::BadRequest("No conversation provided".into()));
    }

    let analyzer = state.analyzer()?;
    let started = Instant::now();

    // Model inference is a coarse-grained blocking call; keep it off the
    // async executor.
    let conversation = request.conversation;
    let report = tokio::task::spawn_blocking(move || analyzer.analyze(&conversation))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    Ok(Json(AnalyzeResponse::from_report(report, elapsed_ms)))
}

/// `GET /api/health` — service liveness and knowledge base readiness.
async fn health(State(state): State<Arc<CoreState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        knowledge_base_ready: state.is_ready(),
        drug_count: state.drug_count(),
        version: config::APP_VERSION,
    })
}
