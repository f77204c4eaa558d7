// src/lib.rs
// Public library surface for the service binary, the demo and integration tests.

pub mod analyze;
pub mod api;
pub mod category;
pub mod config;
pub mod error;
pub mod metrics;
pub mod normalize;
pub mod reference;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{ScoreResult, ScoringEngine};
pub use crate::api::router;
pub use crate::category::ProductCategory;
pub use crate::config::ScoringPolicy;
pub use crate::error::AnalysisError;
pub use crate::normalize::{IngredientsInput, ProductPayload};

/// Full in-process app: API routes, debug routes and `/metrics`.
/// Loads the scoring policy from the environment (see `config`).
pub async fn app() -> anyhow::Result<axum::Router> {
    let state = api::AppState::from_env()?;
    let metrics = metrics::Metrics::init()?;
    Ok(api::router(state).merge(metrics.router()))
}
