//! Debug endpoints: inspect the active policy and reference tables, and preview a score.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::category::ProductCategory;
use crate::config::ScoringPolicy;
use crate::error::AnalysisError;
use crate::normalize::IngredientsInput;

#[derive(Debug, Serialize)]
pub struct ReferenceOut {
    pub endocrine_disruptors: usize,
    pub toxic_ingredients: usize,
    pub allergens: usize,
    pub actives: usize,
    pub ecotoxicity: usize,
    pub detergent_irritants: usize,
    pub biodegradability: usize,
    pub certifications: usize,
    pub natural_markers: usize,
    pub synthetic_markers: usize,
    pub cosmetic_kinds: usize,
    pub detergent_types: usize,
    pub cosmetic_brands: usize,
}

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    pub category: String,
    pub ingredients: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PreviewOut {
    pub score: u8,
    pub confidence: f32,
    pub reasons: Vec<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/debug/policy", get(get_policy))
        .route("/debug/reference", get(get_reference))
        .route("/debug/score_preview", get(get_score_preview))
}

async fn get_policy(State(state): State<AppState>) -> Json<ScoringPolicy> {
    Json(state.engine.policy().clone())
}

async fn get_reference(State(state): State<AppState>) -> Json<ReferenceOut> {
    let t = state.engine.tables();
    Json(ReferenceOut {
        endocrine_disruptors: t.endocrine_disruptors.len(),
        toxic_ingredients: t.toxic_ingredients.len(),
        allergens: t.allergens.len(),
        actives: t.actives.len(),
        ecotoxicity: t.ecotoxicity.len(),
        detergent_irritants: t.detergent_irritants.len(),
        biodegradability: t.biodegradability.len(),
        certifications: t.certifications.len(),
        natural_markers: t.origin.natural.len(),
        synthetic_markers: t.origin.synthetic.len(),
        cosmetic_kinds: t.vocabulary.cosmetic_kinds.len(),
        detergent_types: t.vocabulary.detergent_types.len(),
        cosmetic_brands: t.vocabulary.cosmetic_brands.len(),
    })
}

/// e.g. `/debug/score_preview?category=cosmetic&ingredients=AQUA,GLYCERIN`
async fn get_score_preview(
    State(state): State<AppState>,
    Query(q): Query<PreviewQuery>,
) -> Result<Json<PreviewOut>, AnalysisError> {
    let input = IngredientsInput::from(q.ingredients);
    let name = q.name.as_deref();
    let result = match ProductCategory::from_label(&q.category) {
        Some(ProductCategory::Cosmetic) => state.engine.analyze_cosmetic(&input, name)?,
        Some(ProductCategory::Detergent) => state.engine.analyze_detergent(&input, name, &[])?,
        _ => return Err(AnalysisError::UnsupportedCategory(q.category)),
    };

    let reasons = result
        .breakdown
        .iter()
        .map(|(dim, s)| format!("{:?}={} (w={:.2}): {}", dim, s.score, s.weight, s.details))
        .collect();
    Ok(Json(PreviewOut {
        score: result.score,
        confidence: result.confidence,
        reasons,
    }))
}
