//! Score aggregator.
//!
//! overall = round_half_up( Σ weight_d * score_d / Σ weight_d )
//!
//! The weight vector is the category profile's; a dimension that has a weight but no
//! sub-score, or weights that sum to zero, is an engine failure, not a bad input.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::AnalysisError;

/// A breakdown dimension. Cosmetics use the first four, detergents the last four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Safety,
    Efficacy,
    Allergens,
    Formulation,
    Ecotoxicity,
    Biodegradability,
    Irritation,
    Environmental,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubScore {
    pub score: u8,
    pub weight: f32,
    pub details: String,
}

pub type Breakdown = BTreeMap<Dimension, SubScore>;

/// Attach profile weights to computed sub-scores.
pub fn build_breakdown(
    weights: &BTreeMap<Dimension, f32>,
    mut scores: BTreeMap<Dimension, (u8, String)>,
) -> Result<Breakdown, AnalysisError> {
    weights
        .iter()
        .map(|(dim, &weight)| {
            let (score, details) = scores.remove(dim).ok_or_else(|| {
                AnalysisError::Internal(format!("no sub-score computed for dimension {:?}", dim))
            })?;
            Ok((
                *dim,
                SubScore {
                    score: score.min(100),
                    weight,
                    details,
                },
            ))
        })
        .collect()
}

/// Weighted overall score in [0, 100].
pub fn aggregate(breakdown: &Breakdown) -> Result<u8, AnalysisError> {
    let denom: f64 = breakdown.values().map(|s| s.weight as f64).sum();
    if !denom.is_finite() || denom <= 1e-6 {
        return Err(AnalysisError::Internal(format!(
            "invalid aggregation weights (sum = {})",
            denom
        )));
    }
    let raw: f64 = breakdown
        .values()
        .map(|s| s.weight as f64 * s.score as f64)
        .sum();
    Ok(round_half_up(raw / denom).clamp(0.0, 100.0) as u8)
}

fn round_half_up(x: f64) -> f64 {
    // Snap float noise (e.g. 24.499999999) before rounding.
    ((x * 1e9).round() / 1e9 + 0.5).floor()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(score: u8, weight: f32) -> SubScore {
        SubScore {
            score,
            weight,
            details: String::new(),
        }
    }

    #[test]
    fn cosmetic_weights_combine_sub_scores() {
        let b: Breakdown = BTreeMap::from([
            (Dimension::Safety, sub(30, 0.4)),
            (Dimension::Efficacy, sub(0, 0.3)),
            (Dimension::Allergens, sub(100, 0.2)),
            (Dimension::Formulation, sub(100, 0.1)),
        ]);
        assert_eq!(aggregate(&b).unwrap(), 42);
    }

    #[test]
    fn rounds_half_up() {
        let b: Breakdown = BTreeMap::from([
            (Dimension::Safety, sub(25, 0.5)),
            (Dimension::Efficacy, sub(26, 0.5)),
        ]);
        assert_eq!(aggregate(&b).unwrap(), 26);
    }

    #[test]
    fn zero_weights_are_an_internal_error() {
        let b: Breakdown = BTreeMap::from([(Dimension::Safety, sub(50, 0.0))]);
        assert!(matches!(aggregate(&b), Err(AnalysisError::Internal(_))));
    }

    #[test]
    fn missing_dimension_is_an_internal_error() {
        let weights = BTreeMap::from([(Dimension::Safety, 1.0), (Dimension::Irritation, 1.0)]);
        let scores = BTreeMap::from([(Dimension::Safety, (90, String::new()))]);
        assert!(matches!(
            build_breakdown(&weights, scores),
            Err(AnalysisError::Internal(_))
        ));
    }

    #[test]
    fn unweighted_sub_scores_are_left_out() {
        let weights = BTreeMap::from([(Dimension::Safety, 1.0)]);
        let scores = BTreeMap::from([
            (Dimension::Safety, (90, "ok".to_string())),
            (Dimension::Efficacy, (10, String::new())),
        ]);
        let b = build_breakdown(&weights, scores).unwrap();
        assert_eq!(b.len(), 1);
        assert_eq!(aggregate(&b).unwrap(), 90);
    }
}
