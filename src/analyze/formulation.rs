//! Formulation / environmental analyzer.
//!
//! Always works on the water-stripped token list.
//!
//! - Complexity: 100, minus a penalty for long lists, plus a bonus for very short ones.
//!   The bonus is kept above 100 until the final clamp, so it lifts the detergent blend.
//! - Cosmetics: the sub-score is the complexity score, clamped. Certifications found in
//!   the name are reported (they feed confidence) but not scored.
//! - Detergents: the complexity score is blended with the natural ratio, then distinct
//!   eco-certifications (supplied list or product name) add their bonuses up to a cap.

use serde::Serialize;

use crate::category::ProductCategory;
use crate::config::FormulationPolicy;
use crate::normalize::IngredientList;
use crate::reference::{Origin, ReferenceTables};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sustainability {
    Excellent,
    Good,
    Moderate,
    Poor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificationHit {
    pub name: String,
    pub bonus: u8,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormulationAnalysis {
    /// Ingredients counted, water excluded.
    pub ingredient_count: usize,
    pub complexity: Complexity,
    pub complexity_score: u8,
    /// Share of classified ingredients that are natural; `None` when not computed (cosmetics).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub natural_ratio: Option<f32>,
    pub natural_count: usize,
    pub synthetic_count: usize,
    pub certifications_detected: Vec<CertificationHit>,
    pub certification_bonus: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_kind: Option<String>,
    pub sustainability: Sustainability,
    pub score: u8,
}

/// Tier label and unclamped complexity points (may exceed 100 by the simplicity bonus).
fn complexity(count: usize, policy: &FormulationPolicy) -> (Complexity, u32) {
    let (label, delta): (Complexity, i64) = if count > policy.long_list {
        (Complexity::Complex, -(policy.long_penalty as i64))
    } else if count > policy.medium_list {
        (Complexity::Moderate, -(policy.medium_penalty as i64))
    } else if count <= policy.simple_list {
        (Complexity::Simple, policy.simple_bonus as i64)
    } else {
        (Complexity::Moderate, 0)
    };
    (label, (100 + delta).max(0) as u32)
}

pub fn sustainability(score: u8, policy: &FormulationPolicy) -> Sustainability {
    if score >= policy.excellent_threshold {
        Sustainability::Excellent
    } else if score >= policy.good_threshold {
        Sustainability::Good
    } else if score >= policy.moderate_threshold {
        Sustainability::Moderate
    } else {
        Sustainability::Poor
    }
}

fn certification_hits(
    tables: &ReferenceTables,
    category: ProductCategory,
    product_name: Option<&str>,
    certifications: &[String],
) -> Vec<CertificationHit> {
    tables
        .detect_certifications(category, product_name, certifications)
        .into_iter()
        .map(|c| CertificationHit {
            name: c.name.clone(),
            bonus: c.bonus,
            source: c.source.clone(),
        })
        .collect()
}

pub fn analyze_cosmetic(
    tokens: &IngredientList,
    product_name: Option<&str>,
    tables: &ReferenceTables,
    policy: &FormulationPolicy,
) -> FormulationAnalysis {
    let stripped = tokens.without_water();
    let (label, points) = complexity(stripped.len(), policy);
    let score = points.min(100) as u8;

    FormulationAnalysis {
        ingredient_count: stripped.len(),
        complexity: label,
        complexity_score: score,
        natural_ratio: None,
        natural_count: 0,
        synthetic_count: 0,
        certifications_detected: certification_hits(tables, ProductCategory::Cosmetic, product_name, &[]),
        certification_bonus: 0,
        product_kind: product_name
            .and_then(|n| tables.vocabulary.cosmetic_kind(n))
            .map(str::to_string),
        sustainability: sustainability(score, policy),
        score,
    }
}

pub fn analyze_detergent(
    tokens: &IngredientList,
    product_name: Option<&str>,
    certifications: &[String],
    tables: &ReferenceTables,
    policy: &FormulationPolicy,
) -> FormulationAnalysis {
    let stripped = tokens.without_water();
    let (label, complexity_points) = complexity(stripped.len(), policy);

    let (mut natural_count, mut synthetic_count) = (0usize, 0usize);
    for t in stripped.iter() {
        match tables.origin.classify(t.as_str()) {
            Some(Origin::Natural) => natural_count += 1,
            Some(Origin::Synthetic) => synthetic_count += 1,
            None => {}
        }
    }
    let classified = natural_count + synthetic_count;
    let natural_ratio = if classified == 0 {
        policy.neutral_natural_ratio
    } else {
        natural_count as f32 / classified as f32
    };

    let certifications_detected =
        certification_hits(tables, ProductCategory::Detergent, product_name, certifications);
    let certification_bonus = certifications_detected
        .iter()
        .map(|c| c.bonus as u32)
        .sum::<u32>()
        .min(policy.certification_cap);

    let w = policy.complexity_weight;
    let blended = w * complexity_points as f32 + (1.0 - w) * natural_ratio * 100.0;
    let score = (blended + certification_bonus as f32).round().clamp(0.0, 100.0) as u8;

    FormulationAnalysis {
        ingredient_count: stripped.len(),
        complexity: label,
        complexity_score: complexity_points.min(100) as u8,
        natural_ratio: Some(natural_ratio),
        natural_count,
        synthetic_count,
        certifications_detected,
        certification_bonus: certification_bonus as u8,
        product_kind: product_name
            .and_then(|n| tables.vocabulary.detergent_type(n))
            .map(str::to_string),
        sustainability: sustainability(score, policy),
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize, IngredientsInput};
    use crate::reference::tables;

    fn list(s: &str) -> IngredientList {
        normalize(&IngredientsInput::from(s)).unwrap()
    }

    fn n_ingredients(n: usize) -> IngredientList {
        let items: Vec<String> = (0..n).map(|i| format!("INGREDIENT {}", i)).collect();
        normalize(&IngredientsInput::List(items)).unwrap()
    }

    #[test]
    fn complexity_tiers() {
        let p = FormulationPolicy::default();
        let t = tables();
        let short = analyze_cosmetic(&n_ingredients(8), None, t, &p);
        assert_eq!(short.complexity, Complexity::Simple);
        assert_eq!(short.score, 100);

        let mid = analyze_cosmetic(&n_ingredients(12), None, t, &p);
        assert_eq!(mid.complexity, Complexity::Moderate);
        assert_eq!(mid.score, 100);

        let longer = analyze_cosmetic(&n_ingredients(20), None, t, &p);
        assert_eq!(longer.score, 90);
        assert_eq!(longer.sustainability, Sustainability::Excellent);

        let long = analyze_cosmetic(&n_ingredients(30), None, t, &p);
        assert_eq!(long.complexity, Complexity::Complex);
        assert_eq!(long.score, 80);
    }

    #[test]
    fn simplicity_bonus_lifts_detergent_score() {
        let p = FormulationPolicy::default();
        let t = tables();
        let short = analyze_detergent(&n_ingredients(8), None, &[], t, &p);
        let mid = analyze_detergent(&n_ingredients(12), None, &[], t, &p);
        assert_eq!(short.complexity, Complexity::Simple);
        assert_eq!(mid.complexity, Complexity::Moderate);
        assert_eq!(short.complexity_score, 100);
        assert!(short.score > mid.score, "{} vs {}", short.score, mid.score);
    }

    #[test]
    fn water_is_not_counted() {
        let f = analyze_cosmetic(&list("AQUA, GLYCERIN"), None, tables(), &FormulationPolicy::default());
        assert_eq!(f.ingredient_count, 1);
    }

    #[test]
    fn cosmetic_reports_name_certifications_and_kind() {
        let f = analyze_cosmetic(
            &list("AQUA, GLYCERIN"),
            Some("Crème visage COSMOS Organic"),
            tables(),
            &FormulationPolicy::default(),
        );
        assert_eq!(f.certifications_detected.len(), 1);
        assert_eq!(f.certification_bonus, 0);
        assert_eq!(f.product_kind.as_deref(), Some("soin"));
    }

    #[test]
    fn detergent_natural_ratio_and_certifications() {
        let p = FormulationPolicy::default();
        let f = analyze_detergent(
            &list("AQUA, COCO GLUCOSIDE, SODIUM LAURYL SULFATE"),
            Some("Lessive Ecocert"),
            &["EU Ecolabel".to_string()],
            tables(),
            &p,
        );
        assert_eq!(f.natural_count, 1);
        assert_eq!(f.synthetic_count, 1);
        assert_eq!(f.natural_ratio, Some(0.5));
        // 0.5 * 105 + 0.5 * 50 = 77.5, + (15 + 15) bonus, clamped
        assert_eq!(f.certification_bonus, 30);
        assert_eq!(f.score, 100);
        assert_eq!(f.product_kind.as_deref(), Some("lessive"));
    }

    #[test]
    fn certification_bonus_is_capped() {
        let p = FormulationPolicy::default();
        let f = analyze_detergent(
            &list("SODIUM LAURYL SULFATE, SODIUM TRIPOLYPHOSPHATE"),
            None,
            &[
                "EU Ecolabel".to_string(),
                "Ecocert".to_string(),
                "Nordic Swan".to_string(),
                "Cradle to Cradle".to_string(),
            ],
            tables(),
            &p,
        );
        assert_eq!(f.certifications_detected.len(), 4);
        assert_eq!(f.certification_bonus, 30);
        // 0.5 * 105 + 0.5 * 0 + 30
        assert_eq!(f.score, 83);
    }

    #[test]
    fn unclassified_ingredients_use_neutral_ratio() {
        let f = analyze_detergent(
            &list("MYSTERY A, MYSTERY B"),
            None,
            &[],
            tables(),
            &FormulationPolicy::default(),
        );
        assert_eq!(f.natural_ratio, Some(0.5));
        // 0.5 * 105 + 0.5 * 50
        assert_eq!(f.score, 78);
        assert_eq!(f.sustainability, Sustainability::Good);
    }
}
