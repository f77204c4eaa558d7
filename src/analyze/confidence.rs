//! Confidence calculator shared by every product category.
//!
//! Confidence estimates how trustworthy a score is from the completeness of the input,
//! not from scientific certainty:
//!
//! base
//! + composition present
//! + ingredient-count tier (highest matching breakpoint)
//! + informative product name
//! + category keyword matches in the name (capped)
//! + recognized-ingredient fraction x profile weight
//! + category-specific signals: full list, recognized kind/type, known brand, certifications (capped)
//!
//! The sum is clamped to [0, 1] and rounded to two decimals.

use serde::Serialize;

use crate::config::{CategoryProfile, ConfidencePolicy};
use crate::normalize::{contains_phrase, fold_label};

/// What the calculator needs to know about one analysis call.
#[derive(Debug, Clone, Default)]
pub struct ConfidenceInputs<'a> {
    pub has_composition: bool,
    pub ingredient_count: usize,
    pub recognized_count: usize,
    pub product_name: Option<&'a str>,
    pub recognized_kind: bool,
    pub known_brand: bool,
    pub certification_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    VeryHigh,
    High,
    Moderate,
    Low,
}

impl ConfidenceLevel {
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence >= 0.8 {
            ConfidenceLevel::VeryHigh
        } else if confidence >= 0.6 {
            ConfidenceLevel::High
        } else if confidence >= 0.4 {
            ConfidenceLevel::Moderate
        } else {
            ConfidenceLevel::Low
        }
    }

    /// User-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceLevel::VeryHigh => "Très fiable",
            ConfidenceLevel::High => "Fiable",
            ConfidenceLevel::Moderate => "Modérément fiable",
            ConfidenceLevel::Low => "Peu fiable",
        }
    }
}

pub fn label_for(confidence: f32) -> &'static str {
    ConfidenceLevel::from_confidence(confidence).label()
}

/// Whether a score with this confidence may be shown to end users.
/// One threshold for every category.
pub fn is_publishable(confidence: f32, policy: &ConfidencePolicy) -> bool {
    confidence >= policy.publishable_threshold
}

/// Number of distinct profile keywords found (whole words) in the product name.
pub fn keyword_matches(product_name: &str, profile: &CategoryProfile) -> usize {
    let hay = fold_label(product_name);
    profile
        .keywords
        .iter()
        .filter(|k| contains_phrase(&hay, &fold_label(k)))
        .count()
}

pub fn calculate(inputs: &ConfidenceInputs<'_>, profile: &CategoryProfile, policy: &ConfidencePolicy) -> f32 {
    let mut c = policy.base;

    if inputs.has_composition {
        c += policy.composition_increment;
    }

    if let Some(tier) = policy
        .count_tiers
        .iter()
        .find(|t| inputs.ingredient_count >= t.min)
    {
        c += tier.increment;
    }

    if let Some(name) = inputs.product_name {
        if name.trim().chars().count() > policy.name_min_len {
            c += policy.name_increment;
        }
        let hits = keyword_matches(name, profile) as f32;
        c += (hits * profile.keyword_increment).min(profile.keyword_cap);
    }

    if inputs.ingredient_count > 0 {
        let recognized = inputs.recognized_count.min(inputs.ingredient_count);
        c += profile.recognition_weight * recognized as f32 / inputs.ingredient_count as f32;
    }

    if profile.full_list_min > 0 && inputs.ingredient_count >= profile.full_list_min {
        c += profile.full_list_increment;
    }
    if inputs.recognized_kind {
        c += profile.kind_increment;
    }
    if inputs.known_brand {
        c += profile.brand_increment;
    }
    c += (inputs.certification_count as f32 * profile.certification_increment)
        .min(profile.certification_cap);

    round2(c.clamp(0.0, 1.0))
}

fn round2(x: f32) -> f32 {
    (x * 100.0).round() / 100.0
}
