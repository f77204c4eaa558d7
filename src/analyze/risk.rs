//! Risk analyzer: endocrine disruptors and toxic/sensitizing ingredients.
//!
//! Starting from 100, every endocrine hit costs its risk-level penalty and every
//! toxic hit costs a flat penalty (a token may hit both tables). The overall risk tier
//! comes from the penalty *ratio* `points / (ingredients x high penalty)`, so long and
//! short formulations are rated on the same scale.

use serde::Serialize;
use std::collections::HashSet;

use crate::config::{LevelPoints, RiskPolicy};
use crate::normalize::IngredientList;
use crate::reference::{HazardEntry, Level, ReferenceTables, Table};

/// One matched hazard, with the table metadata kept for explainability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HazardHit {
    pub ingredient: String,
    pub matched_entry: String,
    pub risk_level: Level,
    pub effect: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAnalysis {
    pub endocrine_disruptors: Vec<HazardHit>,
    pub toxic_ingredients: Vec<HazardHit>,
    pub penalty_points: u32,
    pub risk_ratio: f32,
    pub overall_risk: Level,
    pub score: u8,
}

/// Scan tokens against one hazard table. A table entry is reported at most once,
/// even if several aliases of it are present.
pub(crate) fn scan_hazards(tokens: &IngredientList, table: &Table<HazardEntry>) -> Vec<HazardHit> {
    let mut seen = HashSet::new();
    tokens
        .iter()
        .filter_map(|t| table.get(t.as_str()).map(|e| (t, e)))
        .filter(|(_, e)| seen.insert(e.name.as_str()))
        .map(|(t, e)| HazardHit {
            ingredient: t.to_string(),
            matched_entry: e.name.clone(),
            risk_level: e.risk_level,
            effect: e.effect.clone(),
            source: e.source.clone(),
        })
        .collect()
}

/// Total penalty of a set of hits under per-level points.
pub(crate) fn penalty_for(hits: &[HazardHit], points: &LevelPoints) -> u32 {
    hits.iter().map(|h| points.for_level(h.risk_level)).sum()
}

/// `100 - points`, floored at zero.
pub(crate) fn score_from_penalty(points: u32) -> u8 {
    100u32.saturating_sub(points) as u8
}

pub fn analyze(tokens: &IngredientList, tables: &ReferenceTables, policy: &RiskPolicy) -> RiskAnalysis {
    let endocrine_disruptors = scan_hazards(tokens, &tables.endocrine_disruptors);
    let toxic_ingredients = scan_hazards(tokens, &tables.toxic_ingredients);

    let penalty_points = penalty_for(&endocrine_disruptors, &policy.endocrine_penalties)
        + toxic_ingredients.len() as u32 * policy.toxic_penalty;

    let max_points = tokens.len().max(1) as f32 * policy.endocrine_penalties.high.max(1) as f32;
    let risk_ratio = penalty_points as f32 / max_points;

    let overall_risk = if risk_ratio > policy.high_ratio {
        Level::High
    } else if risk_ratio > policy.medium_ratio {
        Level::Medium
    } else {
        Level::Low
    };

    RiskAnalysis {
        endocrine_disruptors,
        toxic_ingredients,
        penalty_points,
        risk_ratio,
        overall_risk,
        score: score_from_penalty(penalty_points),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize, IngredientsInput};
    use crate::reference::tables;

    fn run(s: &str) -> RiskAnalysis {
        let list = normalize(&IngredientsInput::from(s)).unwrap();
        analyze(&list, tables(), &RiskPolicy::default())
    }

    #[test]
    fn clean_formulation_is_low_risk() {
        let r = run("AQUA, GLYCERIN, TOCOPHEROL");
        assert_eq!(r.score, 100);
        assert_eq!(r.penalty_points, 0);
        assert_eq!(r.overall_risk, Level::Low);
        assert!(r.endocrine_disruptors.is_empty());
    }

    #[test]
    fn endocrine_and_toxic_tables_are_independent() {
        // TRICLOSAN: high endocrine (15) + toxic (5)
        let r = run("AQUA, TRICLOSAN");
        assert_eq!(r.endocrine_disruptors.len(), 1);
        assert_eq!(r.toxic_ingredients.len(), 1);
        assert_eq!(r.penalty_points, 20);
        assert_eq!(r.score, 80);
        assert_eq!(r.overall_risk, Level::High);
    }

    #[test]
    fn penalties_follow_risk_levels() {
        // METHYLPARABEN low (3), ETHYLPARABEN medium (8)
        let r = run("METHYLPARABEN, ETHYLPARABEN");
        assert_eq!(r.penalty_points, 11);
        assert_eq!(r.score, 89);
    }

    #[test]
    fn ratio_normalizes_across_lengths() {
        // one medium hit: 8 / (2 x 15) = 0.27 -> high; 8 / (8 x 15) = 0.07 -> low
        assert_eq!(run("AQUA, ETHYLPARABEN").overall_risk, Level::High);
        assert_eq!(
            run("AQUA, GLYCERIN, UREA, PANTHENOL, SQUALANE, ALLANTOIN, BISABOLOL, ETHYLPARABEN")
                .overall_risk,
            Level::Low
        );
    }

    #[test]
    fn aliases_do_not_double_count() {
        let r = run("OXYBENZONE, BENZOPHENONE-3");
        assert_eq!(r.endocrine_disruptors.len(), 1);
        assert_eq!(r.endocrine_disruptors[0].matched_entry, "BENZOPHENONE-3");
        assert_eq!(r.endocrine_disruptors[0].ingredient, "OXYBENZONE");
    }

    #[test]
    fn score_is_clamped_at_zero() {
        let r = run(
            "BUTYLPARABEN, PROPYLPARABEN, ISOBUTYLPARABEN, TRICLOSAN, BHA, BENZOPHENONE-3, \
             BENZOPHENONE-1, CYCLOTETRASILOXANE, DIBUTYL PHTHALATE, NONOXYNOL-9",
        );
        assert_eq!(r.score, 0);
        assert!(r.penalty_points > 100);
    }
}
