// src/api.rs
//! HTTP collaborator surface.
//!
//! Routes:
//! - GET  /health
//! - POST /api/analyze            (dispatch on payload `category`)
//! - POST /api/analyze/cosmetic
//! - POST /api/analyze/detergent
//! - GET  /debug/*                (see `analyze::debug`)

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::CorsLayer;

use crate::analyze::{self, ScoreResult, ScoringEngine};
use crate::category::ProductCategory;
use crate::config::ScoringPolicy;
use crate::error::AnalysisError;
use crate::metrics;
use crate::normalize::ProductPayload;

pub const SERVICE_SOURCE: &str = "ecolojia-scoring";

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ScoringEngine>,
}

impl AppState {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self {
            engine: Arc::new(ScoringEngine::new(policy)),
        }
    }

    /// Policy from `$SCORING_CONFIG_PATH` / `config/scoring.toml` / defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(ScoringPolicy::load_default()?))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/analyze", post(analyze_any))
        .route("/api/analyze/cosmetic", post(analyze_cosmetic))
        .route("/api/analyze/detergent", post(analyze_detergent))
        .merge(analyze::debug::router())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct Envelope<T: Serialize> {
    success: bool,
    data: T,
}

#[derive(Serialize)]
struct Stamped<'a> {
    #[serde(flatten)]
    result: &'a ScoreResult,
    timestamp: String,
    source: &'static str,
}

async fn analyze_any(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    respond(&state, None, body)
}

async fn analyze_cosmetic(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    respond(&state, Some(ProductCategory::Cosmetic), body)
}

async fn analyze_detergent(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    respond(&state, Some(ProductCategory::Detergent), body)
}

fn respond(
    state: &AppState,
    category: Option<ProductCategory>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let started = Instant::now();

    let outcome = body
        .map_err(|rej| AnalysisError::InvalidInput(rej.body_text()))
        .and_then(|Json(raw)| ProductPayload::from_value(&raw))
        .and_then(|payload| state.engine.analyze_payload(category, &payload));

    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    match outcome {
        Ok(result) => {
            metrics::record_analysis(Some(result.category), "ok", elapsed_ms);
            let data = Stamped {
                result: &result,
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                source: SERVICE_SOURCE,
            };
            Json(Envelope {
                success: true,
                data,
            })
            .into_response()
        }
        Err(e) => {
            let label = if e.is_client_error() { "invalid" } else { "error" };
            metrics::record_analysis(category, label, elapsed_ms);
            e.into_response()
        }
    }
}
