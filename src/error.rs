//! Error taxonomy of the scoring engine.
//!
//! Validation failures (missing or malformed ingredients, unsupported category) are the
//! caller's fault and map to HTTP 400. Anything that goes wrong inside the engine itself
//! is `Internal` and maps to HTTP 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// Normalization produced zero ingredient tokens, or no ingredient field was supplied.
    MissingIngredients,
    /// The ingredients field (or another payload field) has the wrong shape.
    InvalidInput(String),
    /// The payload asked for a product category this engine does not score.
    UnsupportedCategory(String),
    /// Unexpected failure inside an analyzer or the aggregator.
    Internal(String),
}

impl AnalysisError {
    /// Stable machine-readable code, surfaced as `code` in error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::MissingIngredients => "MISSING_INGREDIENTS",
            AnalysisError::InvalidInput(_) => "INVALID_INPUT",
            AnalysisError::UnsupportedCategory(_) => "UNSUPPORTED_CATEGORY",
            AnalysisError::Internal(_) => "ANALYSIS_FAILED",
        }
    }

    /// `true` for "bad input" errors (4xx class), `false` for engine failures (5xx class).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, AnalysisError::Internal(_))
    }

    pub fn status(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::MissingIngredients => write!(f, "no ingredients to analyze"),
            AnalysisError::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            AnalysisError::UnsupportedCategory(cat) => {
                write!(f, "unsupported product category: {}", cat)
            }
            AnalysisError::Internal(msg) => write!(f, "internal analysis error: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        // Internal details stay in the logs.
        let message = match &self {
            AnalysisError::Internal(_) => "internal analysis error".to_string(),
            other => other.to_string(),
        };
        let body = Json(json!({ "error": message, "code": self.code() }));
        (self.status(), body).into_response()
    }
}
