//! HTTP surface: routing, request/response shapes, and error mapping.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tracing::{Instrument, error, info_span};
use uuid::Uuid;

use luma_core::pipeline::Pipeline;
use luma_shared::{Analysis, LumaError};

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
    started_at: Instant,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            started_at: Instant::now(),
        }
    }
}

/// Build the HTTP router: the analyze endpoint plus a health probe, with
/// permissive CORS for browser-based frontends.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/analyze", post(analyze))
        .route("/healthz", get(healthz))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Body of `POST /analyze`.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// The page to analyze. Optional at the wire level so a missing key
    /// reaches the pipeline's own validation instead of a serde rejection.
    #[serde(default)]
    pub url: Option<String>,
}

async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<Analysis>, (StatusCode, Json<Value>)> {
    let request_id = Uuid::now_v7();
    let url = request.url.unwrap_or_default();

    state
        .pipeline
        .analyze(&url)
        .instrument(info_span!("analyze_request", %request_id))
        .await
        .map(Json)
        .map_err(error_response)
}

/// Map a pipeline error onto the HTTP surface.
///
/// A validation failure is the caller's fault: its message becomes the whole
/// `error` body, with no prefix. Everything else is a 500 carrying the
/// error's own description.
fn error_response(err: LumaError) -> (StatusCode, Json<Value>) {
    match err {
        LumaError::Validation { message } => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
        }
        other => {
            error!(error = %other, "analyze request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": other.to_string() })),
            )
        }
    }
}

async fn healthz(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.started_at.elapsed().as_secs(),
    }))
}
